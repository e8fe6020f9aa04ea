//! Host transport seam.
//!
//! An endpoint never talks to a desktop runtime directly. The host supplies a
//! handle implementing [`IpcTransport`] and the endpoint drives it:
//!
//! - **Main handle**: `on` / `remove_listener` only. Inbound events carry a
//!   [`SenderContext`] naming the renderer that sent them.
//! - **Renderer handle**: additionally exposes a [`MainSender`], the one-way
//!   "send to main" capability. Its presence is what makes a handle a renderer.
//!
//! A [`RendererTarget`] is a handle to one specific renderer, used both as a
//! fixed destination and as the reply path inside a sender context.
//!
//! Everything here is single-threaded: listeners are `Rc` closures invoked
//! synchronously from the host's event loop.

pub mod local;

use crate::error::transport::TransportError;

use std::fmt::{Debug, Display, Formatter, Result as FormatResult};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of one renderer process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RendererId(pub u32);

impl Display for RendererId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "renderer#{}", self.0)
    }
}

/// Transport-level listener: receives the raw event and the message payload.
pub type IpcListener = Rc<dyn Fn(&IpcEvent, &Value)>;

/// Renderer-side capability to send a one-way message to the main process.
pub trait MainSender {
    fn send(&self, channel: &str, message: &Value) -> Result<(), TransportError>;
}

/// Handle to a single renderer process, as seen from main.
pub trait RendererTarget {
    fn id(&self) -> RendererId;

    fn send(&self, channel: &str, message: &Value) -> Result<(), TransportError>;
}

/// Handle to the host's IPC for one side of the process boundary.
pub trait IpcTransport {
    /// Subscribe `listener` to `channel`.
    fn on(&self, channel: &str, listener: IpcListener);

    /// Detach `listener` from `channel`. Unknown listeners are ignored.
    fn remove_listener(&self, channel: &str, listener: &IpcListener);

    /// The send-to-main capability. `Some` only on renderer handles.
    fn main_sender(&self) -> Option<&dyn MainSender> {
        None
    }
}

/// Reply path back to the renderer that originated an inbound event.
#[derive(Clone)]
pub struct SenderContext {
    renderer: Rc<dyn RendererTarget>,
}

impl SenderContext {
    pub fn new(renderer: Rc<dyn RendererTarget>) -> Self {
        Self { renderer }
    }

    pub fn id(&self) -> RendererId {
        self.renderer.id()
    }

    /// Send `message` to the originating renderer on `channel`.
    pub fn reply(&self, channel: &str, message: &Value) -> Result<(), TransportError> {
        self.renderer.send(channel, message)
    }
}

impl Debug for SenderContext {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter
            .debug_struct("SenderContext")
            .field("renderer", &self.renderer.id())
            .finish()
    }
}

/// Inbound transport event.
///
/// Events delivered to main carry the sender; events delivered to a renderer
/// come from main and carry none.
#[derive(Debug, Clone, Default)]
pub struct IpcEvent {
    sender: Option<SenderContext>,
}

impl IpcEvent {
    pub fn from_renderer(sender: SenderContext) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn from_main() -> Self {
        Self { sender: None }
    }

    pub fn sender(&self) -> Option<&SenderContext> {
        self.sender.as_ref()
    }
}
