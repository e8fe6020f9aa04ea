use ipc_endpoint::transport::local::{LocalIpcMain, LocalIpcRenderer};
use ipc_endpoint::{Endpoint, EndpointError, EventHandler, IpcEndpoint, MessageEvent};
use ipc_endpoint::main_proc_object_endpoint;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::{Value, json};

// ============================================================================
// Forward endpoints: a main-process object consumed from renderers.
// Main answers each request synchronously from its handler, the way a proxy
// library's server side does.
// ============================================================================

type Inbox = Rc<RefCell<Vec<Value>>>;

fn collecting_handler() -> (EventHandler, Inbox) {
    let inbox: Inbox = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&inbox);
    let handler: EventHandler = Rc::new(move |event: &MessageEvent| {
        sink.borrow_mut().push(event.data.clone());
    });
    (handler, inbox)
}

/// Install a main-side handler that replies `{"echo": <request>, "to": <renderer id>}`.
fn serve_echo(endpoint: &Rc<IpcEndpoint<LocalIpcMain>>) {
    let weak: Weak<IpcEndpoint<LocalIpcMain>> = Rc::downgrade(endpoint);
    let handler: EventHandler = Rc::new(move |event: &MessageEvent| {
        let to = event.sender().map(|sender| sender.id().0);
        if let Some(endpoint) = weak.upgrade() {
            endpoint
                .post_message(json!({"echo": event.data, "to": to}), &[])
                .expect("reply should route to the caller");
        }
    });
    endpoint.add_event_listener("message", handler).unwrap();
}

fn renderer_client(renderer: &Rc<LocalIpcRenderer>) -> (IpcEndpoint<LocalIpcRenderer>, Inbox) {
    let endpoint = main_proc_object_endpoint(renderer);
    let (handler, inbox) = collecting_handler();
    endpoint.add_event_listener("message", handler).unwrap();
    (endpoint, inbox)
}

/// **VALUE**: Verifies a full request/reply round trip over the in-process bus.
///
/// **WHY THIS MATTERS**: This is the forward direction end to end: renderer posts,
/// main's handler queues the sender and replies, the renderer's handler sees the answer.
///
/// **BUG THIS CATCHES**: Would catch any disagreement between the two sides on wire
/// channel names, or a reply that never reaches the renderer.
#[test]
fn given_renderer_request_when_main_replies_then_renderer_receives_answer() {
    // GIVEN: Main serving echo, one renderer client
    let main = Rc::new(LocalIpcMain::new());
    let server = Rc::new(main_proc_object_endpoint(&main));
    serve_echo(&server);

    let renderer = main.spawn_renderer();
    let (client, inbox) = renderer_client(&renderer);

    // WHEN: Renderer posts a request
    client.post_message(json!({"call": "ping"}), &[]).unwrap();

    // THEN: Reply arrived, queue drained
    assert_eq!(
        *inbox.borrow(),
        vec![json!({"echo": {"call": "ping"}, "to": renderer.id().0})]
    );
    assert_eq!(server.pending_sender_count(), 0);
    assert_eq!(main.listener_count("__comlink_electron_ipc_channel_message"), 1);
}

/// **VALUE**: Verifies each renderer only gets its own replies when several share main.
///
/// **WHY THIS MATTERS**: The sender queue is what keeps renderer A from receiving the
/// result of renderer B's call.
///
/// **BUG THIS CATCHES**: Would catch broadcasting replies or routing by last sender.
#[test]
fn given_two_renderers_when_both_call_then_each_gets_own_reply() {
    let main = Rc::new(LocalIpcMain::new());
    let server = Rc::new(main_proc_object_endpoint(&main));
    serve_echo(&server);

    let first = main.spawn_renderer();
    let second = main.spawn_renderer();
    let (first_client, first_inbox) = renderer_client(&first);
    let (second_client, second_inbox) = renderer_client(&second);

    first_client.post_message(json!(1), &[]).unwrap();
    second_client.post_message(json!(2), &[]).unwrap();
    first_client.post_message(json!(3), &[]).unwrap();

    assert_eq!(
        *first_inbox.borrow(),
        vec![
            json!({"echo": 1, "to": first.id().0}),
            json!({"echo": 3, "to": first.id().0}),
        ]
    );
    assert_eq!(
        *second_inbox.borrow(),
        vec![json!({"echo": 2, "to": second.id().0})]
    );
}

/// **VALUE**: Verifies deferred replies are matched to requests in arrival order.
///
/// **WHY THIS MATTERS**: A main handler may answer later instead of inline; the queue
/// still pairs the N-th reply with the N-th request.
///
/// **BUG THIS CATCHES**: Would catch the queue only working for synchronous replies.
#[test]
fn given_deferred_replies_when_posted_then_fifo_across_renderers() {
    // GIVEN: Main records requests without answering
    let main = Rc::new(LocalIpcMain::new());
    let server = main_proc_object_endpoint(&main);
    let (handler, requests) = collecting_handler();
    server.add_event_listener("message", handler).unwrap();

    let first = main.spawn_renderer();
    let second = main.spawn_renderer();
    let (first_client, first_inbox) = renderer_client(&first);
    let (second_client, second_inbox) = renderer_client(&second);

    // WHEN: Both call, then main answers twice
    first_client.post_message(json!("q1"), &[]).unwrap();
    second_client.post_message(json!("q2"), &[]).unwrap();
    assert_eq!(server.pending_senders(), vec![first.id(), second.id()]);
    assert_eq!(*requests.borrow(), vec![json!("q1"), json!("q2")]);

    server.post_message(json!("a1"), &[]).unwrap();
    server.post_message(json!("a2"), &[]).unwrap();

    // THEN: Answers in order, and a third reply has nowhere to go
    assert_eq!(*first_inbox.borrow(), vec![json!("a1")]);
    assert_eq!(*second_inbox.borrow(), vec![json!("a2")]);
    assert!(matches!(
        server.post_message(json!("a3"), &[]),
        Err(EndpointError::NoPendingSender { .. })
    ));
}

#[test]
fn given_destroyed_renderer_when_replying_then_returns_transport_error() {
    let main = Rc::new(LocalIpcMain::new());
    let server = main_proc_object_endpoint(&main);
    let (handler, _requests) = collecting_handler();
    server.add_event_listener("message", handler).unwrap();

    let renderer = main.spawn_renderer();
    let (client, _inbox) = renderer_client(&renderer);
    client.post_message(json!("q"), &[]).unwrap();
    renderer.destroy();

    let result = server.post_message(json!("a"), &[]);

    assert!(matches!(result, Err(EndpointError::Transport { .. })));
    assert_eq!(server.pending_sender_count(), 0);
}

/// **VALUE**: Verifies unsubscribing on the renderer stops delivery.
///
/// **WHY THIS MATTERS**: Listener cleanup is the caller's job; it must actually work.
///
/// **BUG THIS CATCHES**: Would catch removal detaching a different listener than was attached.
#[test]
fn given_removed_listener_when_reply_sent_then_not_delivered() {
    let main = Rc::new(LocalIpcMain::new());
    let server = Rc::new(main_proc_object_endpoint(&main));
    serve_echo(&server);

    let renderer = main.spawn_renderer();
    let client = main_proc_object_endpoint(&renderer);
    let (handler, inbox) = collecting_handler();
    client.add_event_listener("message", Rc::clone(&handler)).unwrap();
    client.remove_event_listener("message", &handler).unwrap();

    client.post_message(json!("ping"), &[]).unwrap();

    assert!(inbox.borrow().is_empty());
    assert_eq!(
        renderer.listener_count("__comlink_electron_ipc_channel_message"),
        0
    );
}

/// **VALUE**: Verifies a handler can reply and detach itself from inside the dispatch,
/// then be replaced by a fresh subscription.
///
/// **WHY THIS MATTERS**: One-shot servers answer a single call and unsubscribe from
/// their own handler. The endpoint lives on the stack here, shared through `Rc`.
///
/// **BUG THIS CATCHES**: Would catch a transport or handler-map borrow held across the
/// handler call, which turns the re-entrant `post_message` / `remove_event_listener`
/// into a `RefCell` panic.
#[test]
fn given_one_shot_handler_when_it_replies_and_detaches_then_later_calls_need_new_listener() {
    // GIVEN: A main handler that answers once, then removes itself
    let main = Rc::new(LocalIpcMain::new());
    let server = Rc::new(main_proc_object_endpoint(&main));
    let weak = Rc::downgrade(&server);
    let own: Rc<RefCell<Option<EventHandler>>> = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&own);
    let handler: EventHandler = Rc::new(move |event: &MessageEvent| {
        let Some(server) = weak.upgrade() else {
            return;
        };
        server
            .post_message(json!({"once": event.data}), &[])
            .expect("reply should route to the caller");
        if let Some(this) = slot.borrow_mut().take() {
            server
                .remove_event_listener("message", &this)
                .expect("handler was registered on this channel");
        }
    });
    *own.borrow_mut() = Some(Rc::clone(&handler));
    server.add_event_listener("message", handler).unwrap();

    let renderer = main.spawn_renderer();
    let (client, inbox) = renderer_client(&renderer);

    // WHEN: Two calls, the second after the handler detached
    client.post_message(json!("a"), &[]).unwrap();
    client.post_message(json!("b"), &[]).unwrap();

    // THEN: Only the first was answered and nothing is left subscribed
    assert_eq!(*inbox.borrow(), vec![json!({"once": "a"})]);
    assert_eq!(main.listener_count("__comlink_electron_ipc_channel_message"), 0);
    assert_eq!(server.handler_count(), 0);
    assert_eq!(server.pending_sender_count(), 0);

    // WHEN: A new handler takes over
    serve_echo(&server);
    client.post_message(json!("c"), &[]).unwrap();

    // THEN
    assert_eq!(main.listener_count("__comlink_electron_ipc_channel_message"), 1);
    assert_eq!(
        inbox.borrow().last(),
        Some(&json!({"echo": "c", "to": renderer.id().0}))
    );
}
