use ipc_endpoint::transport::local::LocalIpcMain;
use ipc_endpoint::{
    Endpoint, EndpointError, MessageEvent, TransportError, main_proc_object_endpoint,
};

use common::ErrorLocation;

use std::error::Error;
use std::rc::Rc;

use serde_json::json;

/// **VALUE**: Verifies endpoint errors point at the call site that misused the endpoint.
///
/// **WHY THIS MATTERS**: A contract violation is a bug in the caller. The location must
/// name the caller's file, not the endpoint internals.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[track_caller]` somewhere between
/// `post_message` and the error constructor.
#[test]
fn given_post_before_listen_when_formatted_then_includes_caller_location() {
    // GIVEN: An endpoint with no listener
    let main = Rc::new(LocalIpcMain::new());
    let endpoint = main_proc_object_endpoint(&main);

    // WHEN: Posting
    let err = endpoint.post_message(json!(1), &[]).unwrap_err();

    // THEN: Message names the kind and this test file
    let error_string = err.to_string();
    assert!(error_string.contains("Missing Identifier Error"));
    assert!(
        error_string.contains("integration_tests"),
        "location should name the calling file: {error_string}"
    );
}

/// **VALUE**: Verifies transport failures keep their source error.
///
/// **WHY THIS MATTERS**: "Which renderer went away" lives in the transport error.
///
/// **BUG THIS CATCHES**: Would catch the `From<TransportError>` conversion dropping `source`.
#[test]
fn given_transport_failure_when_wrapped_then_source_is_preserved() {
    let main = LocalIpcMain::new();
    let renderer = main.spawn_renderer();
    let client = main_proc_object_endpoint(&renderer);
    client
        .add_event_listener("message", Rc::new(|_: &MessageEvent| {}))
        .unwrap();
    renderer.destroy();

    let err = client.post_message(json!(1), &[]).unwrap_err();

    assert!(matches!(err, EndpointError::Transport { .. }));
    let source = err.source().expect("transport source");
    assert!(source.to_string().contains("renderer#1"));
}

/// **VALUE**: Verifies a converted transport error keeps its text and gains the caller's location.
///
/// **WHY THIS MATTERS**: `?` on a transport call is how every send failure reaches the
/// consuming library; the outer message is all most log lines show.
///
/// **BUG THIS CATCHES**: Would catch the conversion losing the inner message or
/// recording the location of the `From` impl.
#[test]
fn given_transport_error_when_converted_then_message_and_caller_kept() {
    // GIVEN
    let err = TransportError::Send {
        message: "pipe closed".to_string(),
        location: ErrorLocation::caller(),
    };

    // WHEN
    let wrapped: EndpointError = err.into();

    // THEN
    let EndpointError::Transport {
        message, location, ..
    } = &wrapped
    else {
        panic!("expected Transport variant, got {wrapped:?}");
    };
    assert!(message.starts_with("Send Error: pipe closed"));
    assert!(location.file.contains("integration_tests"));
}
