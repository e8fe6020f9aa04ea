// Unit tests for channel identity resolution

use crate::endpoint::{CHANNEL_PREFIX, ChannelName, REVERSE_SUFFIX, wire_channel};
use crate::error::endpoint::EndpointError;

/// **VALUE**: Verifies the wire channel is prefix + identifier + suffix.
///
/// **WHY THIS MATTERS**: Both processes compute this name independently. Any drift in
/// the format and the two sides never hear each other.
///
/// **BUG THIS CATCHES**: Would catch a reordered or dropped component in `resolve()`.
#[test]
fn given_bound_identifier_when_resolved_then_concatenates_prefix_identifier_suffix() {
    // GIVEN: A reverse channel bound to "rpc"
    let channel = ChannelName::new(REVERSE_SUFFIX);
    channel.bind("rpc").unwrap();

    // WHEN: Resolving
    let wire = channel.resolve().unwrap();

    // THEN: Exact wire name
    assert_eq!(wire, "__comlink_electron_ipc_channel_rpc_reverse");
    assert_eq!(wire, format!("{CHANNEL_PREFIX}rpc{REVERSE_SUFFIX}"));
}

/// **VALUE**: Verifies resolution fails before any identifier is bound.
///
/// **WHY THIS MATTERS**: Sending on an endpoint that was never wired to a logical
/// channel would put messages on a channel nobody listens to.
///
/// **BUG THIS CATCHES**: Would catch a default identifier silently standing in.
#[test]
fn given_unbound_channel_when_resolved_then_returns_missing_identifier() {
    let channel = ChannelName::new("");

    let result = channel.resolve();

    assert!(matches!(
        result,
        Err(EndpointError::MissingIdentifier { .. })
    ));
}

/// **VALUE**: Verifies the first identifier wins and rebinding to the same name is fine.
///
/// **WHY THIS MATTERS**: The consuming library registers several handlers on the same
/// logical channel; each registration re-binds.
///
/// **BUG THIS CATCHES**: Would catch treating a repeated identical bind as an error.
#[test]
fn given_bound_identifier_when_bound_again_with_same_name_then_succeeds() {
    let channel = ChannelName::new("");
    channel.bind("message").unwrap();

    let result = channel.bind("message");

    assert!(result.is_ok());
    assert_eq!(channel.identifier().as_deref(), Some("message"));
}

/// **VALUE**: Verifies binding a second, different name is rejected.
///
/// **WHY THIS MATTERS**: Overwriting the identifier would leave the old subscription on
/// the old wire channel while sends go to the new one.
///
/// **BUG THIS CATCHES**: Would catch a silent overwrite of the identifier.
#[test]
fn given_bound_identifier_when_bound_with_other_name_then_returns_rebind_error() {
    // GIVEN: Bound to "a"
    let channel = ChannelName::new("");
    channel.bind("a").unwrap();

    // WHEN: Binding to "b"
    let result = channel.bind("b");

    // THEN: Rejected, original identifier kept
    assert!(matches!(result, Err(EndpointError::ChannelRebind { .. })));
    assert_eq!(channel.resolve().unwrap(), wire_channel("a", ""));
}

#[test]
fn given_empty_identifier_when_bound_then_returns_missing_identifier() {
    let channel = ChannelName::new("");

    assert!(matches!(
        channel.bind(""),
        Err(EndpointError::MissingIdentifier { .. })
    ));
    assert!(channel.identifier().is_none());
}

/// **VALUE**: Verifies `ensure_matches` fails identically for "unset" and "wrong name".
///
/// **WHY THIS MATTERS**: Both are the same caller mistake and must surface the same way.
///
/// **BUG THIS CATCHES**: Would catch an unset identifier being treated as a wildcard.
#[test]
fn given_unset_or_other_identifier_when_matching_then_returns_mismatch() {
    let channel = ChannelName::new("");
    let unset = channel.ensure_matches("boo");

    channel.bind("foo").unwrap();
    let wrong = channel.ensure_matches("boo");
    let right = channel.ensure_matches("foo");

    assert!(matches!(unset, Err(EndpointError::ChannelMismatch { .. })));
    assert!(matches!(wrong, Err(EndpointError::ChannelMismatch { .. })));
    assert!(right.is_ok());

    let message = wrong.unwrap_err().to_string();
    assert!(message.contains("'boo':'foo'"), "got: {message}");
}
