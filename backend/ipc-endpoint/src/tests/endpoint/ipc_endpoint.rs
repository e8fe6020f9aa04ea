// Unit tests for IpcEndpoint routing against recording transports
// End-to-end behaviour over the in-process bus is in integration_tests/endpoint/

use crate::endpoint::{Endpoint, EventHandler, MessageEvent, Role, create_endpoint};
use crate::error::endpoint::EndpointError;
use crate::factory::{main_proc_object_endpoint, renderer_proc_object_endpoint};
use crate::tests::fakes::{RecordingTarget, RecordingTransport, address, event_from};
use crate::transport::{IpcEvent, RendererId, RendererTarget};

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

fn noop_handler() -> EventHandler {
    Rc::new(|_: &MessageEvent| {})
}

fn recording_handler() -> (EventHandler, Rc<RefCell<Vec<MessageEvent>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let handler: EventHandler = Rc::new(move |event: &MessageEvent| {
        sink.borrow_mut().push(event.clone());
    });
    (handler, seen)
}

/// **VALUE**: Verifies `add_event_listener` subscribes on the derived wire channel in both roles.
///
/// **WHY THIS MATTERS**: The logical name from the proxy library must be namespaced or it
/// collides with unrelated host channels.
///
/// **BUG THIS CATCHES**: Would catch subscribing on the raw logical name.
#[test]
fn given_either_role_when_adding_listener_then_subscribes_on_prefixed_channel() {
    for transport in [RecordingTransport::main(), RecordingTransport::renderer()] {
        // GIVEN: A forward endpoint
        let endpoint = main_proc_object_endpoint(&transport);

        // WHEN: Registering on "boo"
        endpoint.add_event_listener("boo", noop_handler()).unwrap();

        // THEN: One subscription on the prefixed channel
        assert_eq!(
            transport.subscription_channels(),
            vec!["__comlink_electron_ipc_channel_boo".to_string()]
        );
        assert_eq!(
            endpoint.channel().unwrap(),
            "__comlink_electron_ipc_channel_boo"
        );
    }
}

#[test]
fn given_reverse_endpoint_when_adding_listener_then_channel_has_reverse_suffix() {
    let transport = RecordingTransport::renderer();
    let endpoint = renderer_proc_object_endpoint(&transport, None);

    endpoint.add_event_listener("boo", noop_handler()).unwrap();

    assert_eq!(
        transport.subscription_channels(),
        vec!["__comlink_electron_ipc_channel_boo_reverse".to_string()]
    );
}

/// **VALUE**: Verifies the example scenario: main role, no target, inbound call, reply.
///
/// **WHY THIS MATTERS**: This is the forward path every main-process object relies on:
/// the reply must reach the renderer that asked.
///
/// **BUG THIS CATCHES**: Would catch a main endpoint that fails to queue the sender or
/// replies on the wrong channel.
#[test]
fn given_main_without_target_when_inbound_then_reply_goes_to_sender() {
    // GIVEN: Main endpoint listening on "rpc"
    let transport = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&transport);
    endpoint.add_event_listener("rpc", noop_handler()).unwrap();

    // WHEN: A renderer calls, then main replies
    let caller = RecordingTarget::new(7);
    transport.fire(&event_from(&caller), json!({"id": 1}));
    assert_eq!(endpoint.pending_sender_count(), 1);
    endpoint.post_message(json!("result"), &[]).unwrap();

    // THEN: Caller received the reply on the resolved channel
    assert_eq!(
        *caller.sent.borrow(),
        vec![(
            "__comlink_electron_ipc_channel_rpc".to_string(),
            json!("result")
        )]
    );
    assert_eq!(endpoint.pending_sender_count(), 0);
}

/// **VALUE**: Verifies FIFO pairing of inbound senders and outbound replies.
///
/// **WHY THIS MATTERS**: With several renderers talking to one main endpoint, the
/// queue is the only thing routing replies.
///
/// **BUG THIS CATCHES**: Would catch LIFO order (`pop_back`) or replies to the latest sender.
#[test]
fn given_two_inbound_events_when_replying_twice_then_replies_in_arrival_order() {
    // GIVEN: Events from renderer 1 then renderer 2
    let transport = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&transport);
    endpoint.add_event_listener("rpc", noop_handler()).unwrap();

    let first = RecordingTarget::new(1);
    let second = RecordingTarget::new(2);
    transport.fire(&event_from(&first), json!("q1"));
    transport.fire(&event_from(&second), json!("q2"));
    assert_eq!(
        endpoint.pending_senders(),
        vec![RendererId(1), RendererId(2)]
    );

    // WHEN: Two replies
    endpoint.post_message(json!("a1"), &[]).unwrap();
    endpoint.post_message(json!("a2"), &[]).unwrap();

    // THEN: First reply to first sender, second to second
    assert_eq!(first.sent.borrow().len(), 1);
    assert_eq!(first.sent.borrow()[0].1, json!("a1"));
    assert_eq!(second.sent.borrow().len(), 1);
    assert_eq!(second.sent.borrow()[0].1, json!("a2"));
}

/// **VALUE**: Verifies a reply with nothing queued fails loudly.
///
/// **WHY THIS MATTERS**: There is no destination to invent; silently dropping the reply
/// would hang the remote caller forever.
///
/// **BUG THIS CATCHES**: Would catch a panic (unwrap on the queue) or a silent drop.
#[test]
fn given_main_without_target_and_empty_queue_when_posting_then_returns_no_pending_sender() {
    let transport = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&transport);
    endpoint.add_event_listener("rpc", noop_handler()).unwrap();

    let result = endpoint.post_message(json!("orphan"), &[]);

    assert!(matches!(result, Err(EndpointError::NoPendingSender { .. })));
}

/// **VALUE**: Verifies a fixed target receives every message and nothing is queued.
///
/// **WHY THIS MATTERS**: Main builds reverse proxies against one known renderer; its
/// requests must go there no matter what else arrives.
///
/// **BUG THIS CATCHES**: Would catch the queue being consulted or filled when a target exists.
#[test]
fn given_main_with_target_when_posting_then_sends_to_target_regardless_of_inbound() {
    // GIVEN: Main reverse endpoint pinned to renderer 3
    let transport = RecordingTransport::main();
    let target = RecordingTarget::new(3);
    let endpoint = renderer_proc_object_endpoint(&transport, Some(target.clone()));
    endpoint.add_event_listener("boo", noop_handler()).unwrap();

    // WHEN: Inbound events arrive from another renderer, then two sends
    let other = RecordingTarget::new(9);
    transport.fire(&event_from(&other), json!(null));
    transport.fire(&event_from(&other), json!(null));
    endpoint.post_message(json!(1), &[]).unwrap();
    endpoint.post_message(json!(2), &[]).unwrap();

    // THEN: Both went to the target, none queued, none to the other renderer
    assert_eq!(endpoint.fixed_target(), Some(RendererId(3)));
    assert_eq!(endpoint.pending_sender_count(), 0);
    assert_eq!(
        *target.sent.borrow(),
        vec![
            ("__comlink_electron_ipc_channel_boo_reverse".to_string(), json!(1)),
            ("__comlink_electron_ipc_channel_boo_reverse".to_string(), json!(2)),
        ]
    );
    assert!(other.sent.borrow().is_empty());
}

/// **VALUE**: Verifies renderer endpoints always send to main and never queue.
///
/// **WHY THIS MATTERS**: A renderer has exactly one destination.
///
/// **BUG THIS CATCHES**: Would catch a renderer endpoint consulting a queue or a target.
#[test]
fn given_renderer_with_target_when_posting_then_sends_to_main_only() {
    // GIVEN: Renderer endpoint handed a target it must ignore
    let transport = RecordingTransport::renderer();
    let target = RecordingTarget::new(4);
    let endpoint = create_endpoint(&transport, "", Some(target.clone() as Rc<dyn RendererTarget>));
    endpoint.add_event_listener("boo", noop_handler()).unwrap();

    // WHEN: Main sends something in, then renderer posts
    transport.fire(&IpcEvent::from_main(), json!("in"));
    endpoint.post_message(json!("out"), &[]).unwrap();

    // THEN: Went to main
    assert_eq!(endpoint.role(), Role::Renderer);
    assert_eq!(endpoint.fixed_target(), None);
    assert_eq!(endpoint.pending_sender_count(), 0);
    assert_eq!(
        *transport.sent_to_main.borrow(),
        vec![(
            "__comlink_electron_ipc_channel_boo".to_string(),
            json!("out")
        )]
    );
    assert!(target.sent.borrow().is_empty());
}

/// **VALUE**: Verifies transferables are rejected in every routing mode before any I/O.
///
/// **WHY THIS MATTERS**: The failure must be early and total; a partial send followed by
/// an error would leave the remote side acting on a message the caller thinks failed.
///
/// **BUG THIS CATCHES**: Would catch validation happening after the send or only in one role.
#[test]
fn given_transferables_when_posting_in_any_mode_then_fails_without_sending() {
    let transfer = [json!("a")];

    // Renderer
    let renderer = RecordingTransport::renderer();
    let endpoint = main_proc_object_endpoint(&renderer);
    endpoint.add_event_listener("boo", noop_handler()).unwrap();
    let result = endpoint.post_message(json!("x"), &transfer);
    assert!(matches!(result, Err(EndpointError::UnsupportedTransfer { .. })));
    assert!(renderer.sent_to_main.borrow().is_empty());

    // Main, queued sender
    let main = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&main);
    endpoint.add_event_listener("boo", noop_handler()).unwrap();
    let caller = RecordingTarget::new(1);
    main.fire(&event_from(&caller), json!(null));
    let result = endpoint.post_message(json!("x"), &transfer);
    assert!(matches!(result, Err(EndpointError::UnsupportedTransfer { .. })));
    assert!(caller.sent.borrow().is_empty());
    assert_eq!(endpoint.pending_sender_count(), 1, "sender must stay queued");

    // Main, fixed target
    let main = RecordingTransport::main();
    let target = RecordingTarget::new(2);
    let endpoint = renderer_proc_object_endpoint(&main, Some(target.clone()));
    endpoint.add_event_listener("boo", noop_handler()).unwrap();
    let result = endpoint.post_message(json!("x"), &transfer);
    assert!(matches!(result, Err(EndpointError::UnsupportedTransfer { .. })));
    assert!(target.sent.borrow().is_empty());
}

#[test]
fn given_no_listener_when_posting_then_returns_missing_identifier() {
    let transport = RecordingTransport::renderer();
    let endpoint = main_proc_object_endpoint(&transport);

    let result = endpoint.post_message(json!("x"), &[]);

    assert!(matches!(result, Err(EndpointError::MissingIdentifier { .. })));
    assert!(transport.sent_to_main.borrow().is_empty());
}

/// **VALUE**: Verifies removal detaches exactly the listener that was attached.
///
/// **WHY THIS MATTERS**: The transport only knows the wrapper, never the caller's
/// handler. Detaching anything else leaves the real subscription live.
///
/// **BUG THIS CATCHES**: Would catch building a fresh wrapper on removal.
#[test]
fn given_registered_handler_when_removed_then_same_wrapper_is_detached() {
    for transport in [RecordingTransport::main(), RecordingTransport::renderer()] {
        let endpoint = main_proc_object_endpoint(&transport);
        let handler = noop_handler();

        endpoint.add_event_listener("boo", Rc::clone(&handler)).unwrap();
        endpoint.remove_event_listener("boo", &handler).unwrap();

        let added = transport.on_calls.borrow()[0].clone();
        let removed = transport.removed.borrow()[0].clone();
        assert_eq!(added, removed);
        assert!(transport.subscriptions.borrow().is_empty());
        assert_eq!(endpoint.handler_count(), 0);
    }
}

/// **VALUE**: Verifies removal with no prior registration fails, and with a wrong name fails.
///
/// **WHY THIS MATTERS**: Both mean the caller lost track of which channel it owns.
///
/// **BUG THIS CATCHES**: Would catch removal silently succeeding on an unbound endpoint.
#[test]
fn given_unset_or_different_channel_when_removing_then_returns_mismatch() {
    for transport in [RecordingTransport::main(), RecordingTransport::renderer()] {
        let endpoint = main_proc_object_endpoint(&transport);
        let handler = noop_handler();

        let unset = endpoint.remove_event_listener("boo", &handler);
        endpoint.add_event_listener("foo", Rc::clone(&handler)).unwrap();
        let wrong = endpoint.remove_event_listener("boo", &handler);

        assert!(matches!(unset, Err(EndpointError::ChannelMismatch { .. })));
        assert!(matches!(wrong, Err(EndpointError::ChannelMismatch { .. })));
        assert!(transport.removed.borrow().is_empty());
    }
}

#[test]
fn given_unknown_handler_when_removing_then_is_noop() {
    let transport = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&transport);
    endpoint.add_event_listener("boo", noop_handler()).unwrap();

    let result = endpoint.remove_event_listener("boo", &noop_handler());

    assert!(result.is_ok());
    assert!(transport.removed.borrow().is_empty());
    assert_eq!(transport.subscriptions.borrow().len(), 1);
}

/// **VALUE**: Verifies registering the same handler twice yields one subscription.
///
/// **WHY THIS MATTERS**: A duplicate subscription would deliver each message twice and,
/// in main role, queue each sender twice, desynchronising every later reply.
///
/// **BUG THIS CATCHES**: Would catch calling `on` again for an already-mapped handler.
#[test]
fn given_same_handler_when_added_twice_then_one_subscription() {
    let transport = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&transport);
    let handler = noop_handler();

    endpoint.add_event_listener("boo", Rc::clone(&handler)).unwrap();
    endpoint.add_event_listener("boo", Rc::clone(&handler)).unwrap();

    assert_eq!(transport.on_calls.borrow().len(), 1);
    assert_eq!(endpoint.handler_count(), 1);

    transport.fire(&event_from(&RecordingTarget::new(1)), json!(null));
    assert_eq!(endpoint.pending_sender_count(), 1);
}

#[test]
fn given_removed_handler_when_added_again_then_resubscribes() {
    let transport = RecordingTransport::renderer();
    let endpoint = main_proc_object_endpoint(&transport);
    let handler = noop_handler();

    endpoint.add_event_listener("boo", Rc::clone(&handler)).unwrap();
    endpoint.remove_event_listener("boo", &handler).unwrap();
    endpoint.add_event_listener("boo", Rc::clone(&handler)).unwrap();

    assert_eq!(transport.on_calls.borrow().len(), 2);
    assert_eq!(transport.subscriptions.borrow().len(), 1);
}

#[test]
fn given_distinct_handlers_when_added_then_each_subscribes() {
    let transport = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&transport);

    endpoint.add_event_listener("boo", noop_handler()).unwrap();
    endpoint.add_event_listener("boo", noop_handler()).unwrap();

    let calls = transport.on_calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].1, calls[1].1);
}

/// **VALUE**: Verifies a second, different channel name is rejected and nothing is attached.
///
/// **WHY THIS MATTERS**: One endpoint serves one logical channel for its lifetime.
///
/// **BUG THIS CATCHES**: Would catch the identifier being overwritten while the first
/// subscription stays on the old wire channel.
#[test]
fn given_bound_endpoint_when_adding_other_channel_then_returns_rebind() {
    let transport = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&transport);
    endpoint.add_event_listener("a", noop_handler()).unwrap();

    let result = endpoint.add_event_listener("b", noop_handler());

    assert!(matches!(result, Err(EndpointError::ChannelRebind { .. })));
    assert_eq!(transport.on_calls.borrow().len(), 1);
    assert_eq!(endpoint.channel_identifier().as_deref(), Some("a"));
}

/// **VALUE**: Verifies the handler sees the payload as `data` plus the original event.
///
/// **WHY THIS MATTERS**: The proxy library reads `data`; main-side code may need the sender.
///
/// **BUG THIS CATCHES**: Would catch the payload being dropped or the sender lost.
#[test]
fn given_inbound_event_when_dispatched_then_handler_receives_data_and_sender() {
    let transport = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&transport);
    let (handler, seen) = recording_handler();
    endpoint.add_event_listener("boo", handler).unwrap();

    transport.fire(&event_from(&RecordingTarget::new(5)), json!({"id": 9}));

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].data, json!({"id": 9}));
    assert_eq!(seen[0].sender().map(|s| s.id()), Some(RendererId(5)));
}

/// **VALUE**: Verifies the sender is queued before the handler runs, so a handler can
/// answer from inside the dispatch.
///
/// **WHY THIS MATTERS**: Proxy libraries reply synchronously from their receive handler,
/// capturing their own endpoint to do it.
///
/// **BUG THIS CATCHES**: Would catch queuing after invoking the handler, or a borrow of
/// the sender queue still held while the handler runs.
#[test]
fn given_handler_replying_synchronously_when_inbound_then_reply_reaches_sender() {
    // GIVEN: A main endpoint whose handler echoes through the endpoint itself
    let transport = RecordingTransport::main();
    let endpoint = Rc::new(main_proc_object_endpoint(&transport));
    let weak = Rc::downgrade(&endpoint);
    let replies: Rc<RefCell<Vec<Result<(), String>>>> = Rc::new(RefCell::new(Vec::new()));
    let outcomes = Rc::clone(&replies);
    let handler: EventHandler = Rc::new(move |event: &MessageEvent| {
        if let Some(endpoint) = weak.upgrade() {
            let outcome = endpoint
                .post_message(event.data.clone(), &[])
                .map_err(|e| e.to_string());
            outcomes.borrow_mut().push(outcome);
        }
    });
    endpoint.add_event_listener("rpc", handler).unwrap();

    // WHEN: A renderer calls
    let caller = RecordingTarget::new(8);
    transport.fire(&event_from(&caller), json!("ping"));

    // THEN: The reply went out during the dispatch and the queue is drained
    assert_eq!(*replies.borrow(), vec![Ok(())]);
    assert_eq!(
        *caller.sent.borrow(),
        vec![("__comlink_electron_ipc_channel_rpc".to_string(), json!("ping"))]
    );
    assert_eq!(endpoint.pending_sender_count(), 0);
}

#[test]
fn given_main_event_without_sender_when_dispatched_then_nothing_is_queued() {
    let transport = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&transport);
    let (handler, seen) = recording_handler();
    endpoint.add_event_listener("boo", handler).unwrap();

    transport.fire(&IpcEvent::default(), json!(1));

    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(endpoint.pending_sender_count(), 0);
}

/// **VALUE**: Verifies the handler map does not keep a detached handler alive.
///
/// **WHY THIS MATTERS**: Endpoints live as long as the host transport; retaining every
/// handler ever registered would leak whatever those closures capture.
///
/// **BUG THIS CATCHES**: Would catch the map holding strong references.
#[test]
fn given_removed_handler_when_caller_drops_it_then_handler_is_released() {
    let transport = RecordingTransport::renderer();
    let endpoint = main_proc_object_endpoint(&transport);
    let handler = noop_handler();
    let weak = Rc::downgrade(&handler);

    endpoint.add_event_listener("boo", Rc::clone(&handler)).unwrap();
    endpoint.remove_event_listener("boo", &handler).unwrap();
    drop(handler);

    assert!(weak.upgrade().is_none());
}

#[test]
fn given_subscribed_wrapper_when_checked_then_address_matches_transport() {
    let transport = RecordingTransport::main();
    let endpoint = main_proc_object_endpoint(&transport);
    endpoint.add_event_listener("boo", noop_handler()).unwrap();

    let subscribed = transport.subscriptions.borrow()[0].1.clone();

    assert_eq!(transport.on_calls.borrow()[0].1, address(&subscribed));
}
