use common::ErrorLocation;

use ipc_endpoint::EndpointError;
use ipc_endpoint::error::config::ConfigError;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the bridge host.
///
/// Sources are flattened to strings so the whole error stays serializable;
/// the location of the conversion is kept alongside.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum BridgeError {
    /// Error from this app (filesystem, wiring)
    #[error("Bridge Error: {message} {location}")]
    Bridge {
        message: String,
        location: ErrorLocation,
    },

    /// Error from endpoint or transport operations
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },
}

impl From<EndpointError> for BridgeError {
    #[track_caller]
    fn from(error: EndpointError) -> Self {
        BridgeError::Core {
            message: error.to_string(),
            location: ErrorLocation::caller(),
        }
    }
}

impl From<ConfigError> for BridgeError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        BridgeError::Config {
            message: error.to_string(),
            location: ErrorLocation::caller(),
        }
    }
}
