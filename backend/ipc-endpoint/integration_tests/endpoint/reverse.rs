use ipc_endpoint::config::ChannelsConfig;
use ipc_endpoint::transport::local::{LocalIpcMain, LocalIpcRenderer};
use ipc_endpoint::{
    Endpoint, EventHandler, IpcEndpoint, MessageEvent, Role, main_proc_object_endpoint,
    renderer_proc_object_endpoint,
};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::{Value, json};

// ============================================================================
// Reverse endpoints: a renderer-process object consumed from main, with main
// pinned to one renderer through a fixed target.
// ============================================================================

/// Renderer-side handler answering `{"double": n}` with `2n`.
fn serve_doubler(endpoint: &Rc<IpcEndpoint<LocalIpcRenderer>>) {
    let weak: Weak<IpcEndpoint<LocalIpcRenderer>> = Rc::downgrade(endpoint);
    let handler: EventHandler = Rc::new(move |event: &MessageEvent| {
        let n = event.data["double"].as_i64().unwrap_or_default();
        if let Some(endpoint) = weak.upgrade() {
            endpoint
                .post_message(json!(n * 2), &[])
                .expect("renderer always reaches main");
        }
    });
    endpoint.add_event_listener("message", handler).unwrap();
}

fn main_client(
    main: &Rc<LocalIpcMain>,
    renderer: &LocalIpcRenderer,
) -> (IpcEndpoint<LocalIpcMain>, Rc<RefCell<Vec<Value>>>) {
    let endpoint = renderer_proc_object_endpoint(main, Some(renderer.web_contents()));
    let inbox = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&inbox);
    endpoint
        .add_event_listener(
            "message",
            Rc::new(move |event: &MessageEvent| sink.borrow_mut().push(event.data.clone())),
        )
        .unwrap();
    (endpoint, inbox)
}

/// **VALUE**: Verifies main can call a renderer-owned object through a fixed target.
///
/// **WHY THIS MATTERS**: This is the reverse direction end to end.
///
/// **BUG THIS CATCHES**: Would catch the reverse suffix differing between sides or main
/// trying to use its (empty) sender queue.
#[test]
fn given_fixed_target_when_main_calls_then_renderer_answers() {
    // GIVEN: Renderer serving a doubler on the reverse channel
    let main = Rc::new(LocalIpcMain::new());
    let renderer = main.spawn_renderer();
    let service = Rc::new(renderer_proc_object_endpoint(&renderer, None));
    serve_doubler(&service);

    // WHEN: Main calls through a target-pinned endpoint
    let (client, inbox) = main_client(&main, &renderer);
    client.post_message(json!({"double": 21}), &[]).unwrap();

    // THEN: Answer arrives at main
    assert_eq!(client.role(), Role::Main);
    assert_eq!(client.fixed_target(), Some(renderer.id()));
    assert_eq!(*inbox.borrow(), vec![json!(42)]);
    assert_eq!(client.pending_sender_count(), 0);
    assert_eq!(
        renderer.listener_count("__comlink_electron_ipc_channel_message_reverse"),
        1
    );
}

/// **VALUE**: Verifies only the pinned renderer is reached when several expose the object.
///
/// **WHY THIS MATTERS**: Every renderer listens on the same reverse channel.
///
/// **BUG THIS CATCHES**: Would catch a fixed target being ignored in favour of broadcasting.
#[test]
fn given_two_renderers_when_main_calls_pinned_one_then_only_it_answers() {
    let main = Rc::new(LocalIpcMain::new());
    let first = main.spawn_renderer();
    let second = main.spawn_renderer();

    let calls: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
    let mut services = Vec::new();
    for renderer in [&first, &second] {
        let service = renderer_proc_object_endpoint(renderer, None);
        let log = Rc::clone(&calls);
        let id = renderer.id().0;
        service
            .add_event_listener(
                "message",
                Rc::new(move |_: &MessageEvent| log.borrow_mut().push(id)),
            )
            .unwrap();
        services.push(service);
    }

    let (client, _inbox) = main_client(&main, &second);
    client.post_message(json!({"double": 1}), &[]).unwrap();

    assert_eq!(*calls.borrow(), vec![second.id().0]);
}

/// **VALUE**: Verifies forward and reverse endpoints coexist on one transport.
///
/// **WHY THIS MATTERS**: The suffixes exist so one transport carries two independent
/// exposed objects.
///
/// **BUG THIS CATCHES**: Would catch cross-talk between the two wire channels.
#[test]
fn given_forward_and_reverse_on_same_channel_name_when_used_then_no_cross_talk() {
    let main = Rc::new(LocalIpcMain::new());
    let renderer = main.spawn_renderer();
    let channels = ChannelsConfig::default();

    let forward_inbox = Rc::new(RefCell::new(Vec::new()));
    let reverse_inbox = Rc::new(RefCell::new(Vec::new()));

    // Main side: forward server records, reverse client pinned to the renderer
    let forward_server = main_proc_object_endpoint(&main);
    let sink = Rc::clone(&forward_inbox);
    forward_server
        .add_event_listener(
            "message",
            Rc::new(move |event: &MessageEvent| sink.borrow_mut().push(event.data.clone())),
        )
        .unwrap();
    let reverse_client = channels.reverse_endpoint(&main, Some(renderer.web_contents()));

    // Renderer side: reverse server records
    let reverse_server = channels.reverse_endpoint(&renderer, None);
    let sink = Rc::clone(&reverse_inbox);
    reverse_server
        .add_event_listener(
            "message",
            Rc::new(move |event: &MessageEvent| sink.borrow_mut().push(event.data.clone())),
        )
        .unwrap();
    let forward_client = channels.forward_endpoint(&renderer);
    forward_client
        .add_event_listener("message", Rc::new(|_: &MessageEvent| {}))
        .unwrap();

    forward_client.post_message(json!("to-main"), &[]).unwrap();
    reverse_client
        .add_event_listener("message", Rc::new(|_: &MessageEvent| {}))
        .unwrap();
    reverse_client
        .post_message(json!("to-renderer"), &[])
        .unwrap();

    assert_eq!(*forward_inbox.borrow(), vec![json!("to-main")]);
    assert_eq!(*reverse_inbox.borrow(), vec![json!("to-renderer")]);
    assert_eq!(forward_server.pending_sender_count(), 1);
}
