// Unit tests for role detection

use crate::endpoint::Role;
use crate::tests::fakes::RecordingTransport;

/// **VALUE**: Verifies role detection is driven purely by the send-to-main capability.
///
/// **WHY THIS MATTERS**: Routing of every outbound message depends on the role. A wrong
/// answer sends replies into the void.
///
/// **BUG THIS CATCHES**: Would catch an inverted probe.
#[test]
fn given_transport_shapes_when_detecting_then_send_capability_means_renderer() {
    assert_eq!(Role::detect(RecordingTransport::main().as_ref()), Role::Main);
    assert_eq!(Role::detect(RecordingTransport::renderer().as_ref()), Role::Renderer);
}

#[test]
fn given_role_when_displayed_then_lowercase_name() {
    assert_eq!(Role::Main.to_string(), "main");
    assert_eq!(Role::Renderer.to_string(), "renderer");
}
