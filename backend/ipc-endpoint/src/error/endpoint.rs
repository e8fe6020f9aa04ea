use crate::error::transport::TransportError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Ways a caller can misuse an endpoint.
///
/// None of these are recoverable at runtime: each one means the consuming
/// protocol or the host application broke the endpoint contract.
#[derive(Debug, ThisError)]
pub enum EndpointError {
    /// Send or resolve attempted before any listener was registered.
    #[error("Missing Identifier Error: {message} {location}")]
    MissingIdentifier {
        message: String,
        location: ErrorLocation,
    },

    /// `remove_event_listener` named a channel other than the registered one.
    #[error("Channel Mismatch Error: {message} {location}")]
    ChannelMismatch {
        message: String,
        location: ErrorLocation,
    },

    /// `add_event_listener` named a second, different channel.
    #[error("Channel Rebind Error: {message} {location}")]
    ChannelRebind {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unsupported Transfer Error: {message} {location}")]
    UnsupportedTransfer {
        message: String,
        location: ErrorLocation,
    },

    /// Main-role reply with no queued inbound request to answer.
    #[error("No Pending Sender Error: {message} {location}")]
    NoPendingSender {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
        #[source]
        source: TransportError,
    },
}

impl From<TransportError> for EndpointError {
    #[track_caller]
    fn from(error: TransportError) -> Self {
        EndpointError::Transport {
            message: error.to_string(),
            location: ErrorLocation::caller(),
            source: error,
        }
    }
}
