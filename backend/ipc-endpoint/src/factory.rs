//! Named constructors for the two exposure directions.
//!
//! Both processes build their side of a pairing with the same function, so the
//! channel suffixes always agree.

use crate::endpoint::{FORWARD_SUFFIX, IpcEndpoint, REVERSE_SUFFIX, create_endpoint};
use crate::transport::{IpcTransport, RendererTarget};

use std::rc::Rc;

/// Endpoint for a main-process object consumed from a renderer.
pub fn main_proc_object_endpoint<T: IpcTransport + ?Sized>(transport: &Rc<T>) -> IpcEndpoint<T> {
    create_endpoint(transport, FORWARD_SUFFIX, None)
}

/// Endpoint for a renderer-process object consumed from main.
///
/// Main should pass the renderer it builds a proxy against as `target`; a
/// renderer passes `None`.
pub fn renderer_proc_object_endpoint<T: IpcTransport + ?Sized>(
    transport: &Rc<T>,
    target: Option<Rc<dyn RendererTarget>>,
) -> IpcEndpoint<T> {
    create_endpoint(transport, REVERSE_SUFFIX, target)
}
