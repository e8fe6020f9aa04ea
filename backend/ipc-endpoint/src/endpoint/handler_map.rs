use crate::endpoint::{EventHandler, MessageEvent};
use crate::transport::{IpcEvent, IpcListener};

use std::cell::RefCell;
use std::ptr;
use std::rc::{Rc, Weak};

use serde_json::Value;

struct HandlerEntry {
    handler: Weak<dyn Fn(&MessageEvent)>,
    listener: Weak<dyn Fn(&IpcEvent, &Value)>,
}

/// Side table from a caller's handler to the listener wrapping it.
///
/// Keyed by `Rc` allocation identity. Both sides are held weakly: the wrapper
/// is owned by the transport subscription and owns the handler, so an entry
/// dies as soon as its subscription is detached.
#[derive(Default)]
pub(crate) struct HandlerMap {
    entries: RefCell<Vec<HandlerEntry>>,
}

impl HandlerMap {
    /// The live wrapper for `handler`, if it is still subscribed.
    pub(crate) fn get(&self, handler: &EventHandler) -> Option<IpcListener> {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| ptr::addr_eq(entry.handler.as_ptr(), Rc::as_ptr(handler)))
            .find_map(|entry| entry.listener.upgrade())
    }

    pub(crate) fn insert(&self, handler: &EventHandler, listener: &IpcListener) {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|entry| entry.listener.strong_count() > 0);
        entries.push(HandlerEntry {
            handler: Rc::downgrade(handler),
            listener: Rc::downgrade(listener),
        });
    }

    pub(crate) fn live_count(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.listener.strong_count() > 0)
            .count()
    }
}
