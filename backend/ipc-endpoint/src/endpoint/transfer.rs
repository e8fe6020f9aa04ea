use crate::error::endpoint::EndpointError;

use common::ErrorLocation;

use serde_json::Value;

/// Reject any transfer list.
///
/// Host IPC copies every message; there is no way to move ownership of a
/// value across processes. Failing here tells the caller the consuming
/// protocol's transfer assumption does not hold, before any I/O happens.
#[track_caller]
pub fn validate_transferables(transferables: &[Value]) -> Result<(), EndpointError> {
    if !transferables.is_empty() {
        return Err(EndpointError::UnsupportedTransfer {
            message: format!(
                "cannot transfer {} value(s) over ipc",
                transferables.len()
            ),
            location: ErrorLocation::caller(),
        });
    }
    Ok(())
}
