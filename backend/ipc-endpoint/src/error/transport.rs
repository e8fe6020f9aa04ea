use crate::transport::RendererId;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("Disconnected Error: {renderer}: {message} {location}")]
    Disconnected {
        renderer: RendererId,
        message: String,
        location: ErrorLocation,
    },
}
