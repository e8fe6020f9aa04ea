use crate::transport::IpcTransport;

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Which side of the process boundary a transport handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Main,
    Renderer,
}

impl Role {
    /// Probe the handle's shape: a send-to-main capability means renderer.
    pub fn detect<T: IpcTransport + ?Sized>(transport: &T) -> Self {
        if transport.main_sender().is_some() {
            Role::Renderer
        } else {
            Role::Main
        }
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            Role::Main => write!(formatter, "main"),
            Role::Renderer => write!(formatter, "renderer"),
        }
    }
}
