// Unit tests for transfer validation

use crate::endpoint::validate_transferables;
use crate::error::endpoint::EndpointError;

use serde_json::json;

#[test]
fn given_no_transferables_when_validating_then_succeeds() {
    assert!(validate_transferables(&[]).is_ok());
}

/// **VALUE**: Verifies any non-empty transfer list is rejected.
///
/// **WHY THIS MATTERS**: Host IPC copies messages. Pretending a transfer happened would
/// leave the sender believing it gave up ownership of something it still holds.
///
/// **BUG THIS CATCHES**: Would catch a validator that only rejects certain value kinds.
#[test]
fn given_transferables_when_validating_then_returns_unsupported_transfer() {
    let result = validate_transferables(&[json!("a"), json!({"port": 1})]);

    let err = result.unwrap_err();
    assert!(matches!(err, EndpointError::UnsupportedTransfer { .. }));
    assert!(err.to_string().contains("2 value(s)"));
}
