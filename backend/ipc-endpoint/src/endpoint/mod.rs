//! Endpoint adapter.
//!
//! Turns a host [`IpcTransport`](crate::transport::IpcTransport) into the
//! three-operation [`Endpoint`] a remote-proxy library drives: register a
//! receive handler, unregister it, post a message. The proxy library never
//! learns which side of the process boundary it runs on.
//!
//! # Routing
//!
//! | Role | Fixed target | `post_message` goes to |
//! |---|---|---|
//! | renderer | ignored | main, via the send-to-main capability |
//! | main | yes | the fixed renderer |
//! | main | no | the oldest queued inbound sender (FIFO reply) |
//!
//! The FIFO reply path has no correlation token: it is correct only while the
//! consuming protocol keeps one request outstanding per endpoint.

mod channel;
mod handler_map;
mod ipc_endpoint;
mod role;
mod transfer;

pub use channel::{CHANNEL_PREFIX, ChannelName, FORWARD_SUFFIX, REVERSE_SUFFIX, wire_channel};
pub use ipc_endpoint::{IpcEndpoint, create_endpoint};
pub use role::Role;
pub use transfer::validate_transferables;

use crate::error::endpoint::EndpointError;
use crate::transport::{IpcEvent, SenderContext};

use std::rc::Rc;

use serde_json::Value;

/// Receive callback installed by the consuming library.
///
/// Identity is the `Rc` allocation: registering a clone of the same `Rc`
/// twice is one registration, two separately built closures are two.
pub type EventHandler = Rc<dyn Fn(&MessageEvent)>;

/// The endpoint capability set.
pub trait Endpoint {
    fn add_event_listener(&self, channel: &str, handler: EventHandler) -> Result<(), EndpointError>;

    fn remove_event_listener(
        &self,
        channel: &str,
        handler: &EventHandler,
    ) -> Result<(), EndpointError>;

    /// Send `message`. `transferables` must be empty: nothing can change
    /// ownership across the process boundary.
    fn post_message(&self, message: Value, transferables: &[Value]) -> Result<(), EndpointError>;
}

/// Event handed to an [`EventHandler`]: the payload plus the transport event
/// it arrived with, so handlers see one shape regardless of role.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub data: Value,
    ipc: IpcEvent,
}

impl MessageEvent {
    pub fn new(data: Value, ipc: IpcEvent) -> Self {
        Self { data, ipc }
    }

    pub fn ipc_event(&self) -> &IpcEvent {
        &self.ipc
    }

    pub fn sender(&self) -> Option<&SenderContext> {
        self.ipc.sender()
    }
}
