//! In-process transport.
//!
//! Simulates one main process and any number of renderers inside a single
//! event loop. Delivery is synchronous: a send runs every subscribed listener
//! before it returns, so a listener that replies immediately produces a nested
//! delivery. Listener lists are snapshotted before dispatch, which lets
//! listeners subscribe, unsubscribe or send while being invoked.
//!
//! Used by the integration tests and by the `ipc-bridge` host binary.

use crate::error::transport::TransportError;
use crate::transport::{
    IpcEvent, IpcListener, IpcTransport, MainSender, RendererId, RendererTarget, SenderContext,
};

use common::ErrorLocation;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ptr;
use std::rc::Rc;

use log::trace;
use serde_json::Value;

/// Per-channel listener lists for one side of the bus.
#[derive(Default)]
struct Listeners {
    table: RefCell<HashMap<String, Vec<IpcListener>>>,
}

impl Listeners {
    fn add(&self, channel: &str, listener: IpcListener) {
        self.table
            .borrow_mut()
            .entry(channel.to_string())
            .or_default()
            .push(listener);
    }

    fn remove(&self, channel: &str, listener: &IpcListener) {
        let mut table = self.table.borrow_mut();
        if let Some(list) = table.get_mut(channel) {
            // Most recently added first, like an event emitter.
            if let Some(position) = list
                .iter()
                .rposition(|candidate| ptr::addr_eq(Rc::as_ptr(candidate), Rc::as_ptr(listener)))
            {
                list.remove(position);
            }
            if list.is_empty() {
                table.remove(channel);
            }
        }
    }

    fn count(&self, channel: &str) -> usize {
        self.table.borrow().get(channel).map_or(0, Vec::len)
    }

    fn dispatch(&self, channel: &str, event: &IpcEvent, message: &Value) -> usize {
        let snapshot = self.table.borrow().get(channel).cloned().unwrap_or_default();
        for listener in &snapshot {
            listener(event, message);
        }
        snapshot.len()
    }
}

struct Bus {
    main_listeners: Listeners,
    next_renderer: Cell<u32>,
}

/// Renderer-side state reachable from main through a [`RendererTarget`].
struct LocalWebContents {
    id: RendererId,
    listeners: Listeners,
    destroyed: Cell<bool>,
}

impl LocalWebContents {
    #[track_caller]
    fn ensure_alive(&self) -> Result<(), TransportError> {
        if self.destroyed.get() {
            return Err(TransportError::Disconnected {
                renderer: self.id,
                message: "renderer has been destroyed".to_string(),
                location: ErrorLocation::caller(),
            });
        }
        Ok(())
    }
}

impl RendererTarget for LocalWebContents {
    fn id(&self) -> RendererId {
        self.id
    }

    fn send(&self, channel: &str, message: &Value) -> Result<(), TransportError> {
        self.ensure_alive()?;
        let delivered = self
            .listeners
            .dispatch(channel, &IpcEvent::from_main(), message);
        trace!("main -> {} on {channel}: {delivered} listener(s)", self.id);
        Ok(())
    }
}

/// Main-process handle of the in-process bus.
pub struct LocalIpcMain {
    bus: Rc<Bus>,
}

impl LocalIpcMain {
    pub fn new() -> Self {
        Self {
            bus: Rc::new(Bus {
                main_listeners: Listeners::default(),
                next_renderer: Cell::new(1),
            }),
        }
    }

    /// Create a renderer attached to this main process.
    ///
    /// Returned as `Rc` because endpoints share the handle with the host.
    pub fn spawn_renderer(&self) -> Rc<LocalIpcRenderer> {
        let id = RendererId(self.bus.next_renderer.get());
        self.bus.next_renderer.set(id.0 + 1);

        Rc::new(LocalIpcRenderer {
            bus: Rc::clone(&self.bus),
            contents: Rc::new(LocalWebContents {
                id,
                listeners: Listeners::default(),
                destroyed: Cell::new(false),
            }),
        })
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.bus.main_listeners.count(channel)
    }
}

impl Default for LocalIpcMain {
    fn default() -> Self {
        Self::new()
    }
}

impl IpcTransport for LocalIpcMain {
    fn on(&self, channel: &str, listener: IpcListener) {
        self.bus.main_listeners.add(channel, listener);
    }

    fn remove_listener(&self, channel: &str, listener: &IpcListener) {
        self.bus.main_listeners.remove(channel, listener);
    }
}

/// Renderer-process handle of the in-process bus.
pub struct LocalIpcRenderer {
    bus: Rc<Bus>,
    contents: Rc<LocalWebContents>,
}

impl LocalIpcRenderer {
    pub fn id(&self) -> RendererId {
        self.contents.id
    }

    /// Main's handle to this renderer, usable as a fixed endpoint target.
    pub fn web_contents(&self) -> Rc<dyn RendererTarget> {
        self.contents.clone()
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.contents.listeners.count(channel)
    }

    /// Mark the renderer as gone. Later sends to or from it fail.
    pub fn destroy(&self) {
        self.contents.destroyed.set(true);
    }
}

impl IpcTransport for LocalIpcRenderer {
    fn on(&self, channel: &str, listener: IpcListener) {
        self.contents.listeners.add(channel, listener);
    }

    fn remove_listener(&self, channel: &str, listener: &IpcListener) {
        self.contents.listeners.remove(channel, listener);
    }

    fn main_sender(&self) -> Option<&dyn MainSender> {
        Some(self)
    }
}

impl MainSender for LocalIpcRenderer {
    fn send(&self, channel: &str, message: &Value) -> Result<(), TransportError> {
        self.contents.ensure_alive()?;
        let event = IpcEvent::from_renderer(SenderContext::new(self.web_contents()));
        let delivered = self.bus.main_listeners.dispatch(channel, &event, message);
        trace!("{} -> main on {channel}: {delivered} listener(s)", self.id());
        Ok(())
    }
}
