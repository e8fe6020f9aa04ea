use crate::error::endpoint::EndpointError;

use common::ErrorLocation;

use std::cell::RefCell;

/// Namespace for every wire channel an endpoint touches.
pub const CHANNEL_PREFIX: &str = "__comlink_electron_ipc_channel_";

/// Suffix for endpoints exposing a main-process object to renderers.
pub const FORWARD_SUFFIX: &str = "";

/// Suffix for endpoints exposing a renderer-process object to main.
pub const REVERSE_SUFFIX: &str = "_reverse";

pub fn wire_channel(identifier: &str, suffix: &str) -> String {
    format!("{CHANNEL_PREFIX}{identifier}{suffix}")
}

/// Per-endpoint channel identity.
///
/// The logical identifier is unset until the consuming library registers its
/// first listener, and is fixed from then on.
#[derive(Debug)]
pub struct ChannelName {
    suffix: String,
    identifier: RefCell<Option<String>>,
}

impl ChannelName {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            identifier: RefCell::new(None),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn identifier(&self) -> Option<String> {
        self.identifier.borrow().clone()
    }

    /// Record `identifier` as the logical channel. Binding the same name again
    /// is a no-op; binding a different one is rejected.
    #[track_caller]
    pub fn bind(&self, identifier: &str) -> Result<(), EndpointError> {
        if identifier.is_empty() {
            return Err(EndpointError::MissingIdentifier {
                message: "channel identifier must not be empty".to_string(),
                location: ErrorLocation::caller(),
            });
        }

        let mut current = self.identifier.borrow_mut();
        match current.as_deref() {
            None => {
                *current = Some(identifier.to_string());
                Ok(())
            }
            Some(bound) if bound == identifier => Ok(()),
            Some(bound) => Err(EndpointError::ChannelRebind {
                message: format!(
                    "endpoint is bound to '{bound}', cannot also listen on '{identifier}'"
                ),
                location: ErrorLocation::caller(),
            }),
        }
    }

    /// The wire channel: prefix + identifier + suffix.
    #[track_caller]
    pub fn resolve(&self) -> Result<String, EndpointError> {
        match self.identifier.borrow().as_deref() {
            Some(identifier) => Ok(wire_channel(identifier, &self.suffix)),
            None => Err(EndpointError::MissingIdentifier {
                message: "channel identifier is missing, no listener was registered".to_string(),
                location: ErrorLocation::caller(),
            }),
        }
    }

    /// Fail unless `identifier` is the bound channel.
    #[track_caller]
    pub fn ensure_matches(&self, identifier: &str) -> Result<(), EndpointError> {
        let current = self.identifier.borrow();
        if current.as_deref() == Some(identifier) {
            return Ok(());
        }
        Err(EndpointError::ChannelMismatch {
            message: format!(
                "channel identifier does not match '{identifier}':'{}'",
                current.as_deref().unwrap_or("<unset>")
            ),
            location: ErrorLocation::caller(),
        })
    }
}
