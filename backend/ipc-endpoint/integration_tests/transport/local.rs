use ipc_endpoint::transport::local::LocalIpcMain;
use ipc_endpoint::{IpcEvent, IpcListener, IpcTransport, RendererId, Role, TransportError};

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};

type Received = Rc<RefCell<Vec<(Option<RendererId>, Value)>>>;

fn recording_listener() -> (IpcListener, Received) {
    let received: Received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    let listener: IpcListener = Rc::new(move |event: &IpcEvent, data: &Value| {
        sink.borrow_mut()
            .push((event.sender().map(|sender| sender.id()), data.clone()));
    });
    (listener, received)
}

/// **VALUE**: Verifies the bus handles have the shapes role detection relies on.
///
/// **WHY THIS MATTERS**: The in-process bus stands in for a real host in every
/// end-to-end test; if its main handle looked like a renderer those tests would be void.
///
/// **BUG THIS CATCHES**: Would catch `LocalIpcMain` exposing a send-to-main capability.
#[test]
fn given_bus_handles_when_detecting_role_then_main_and_renderer() {
    let main = LocalIpcMain::new();
    let renderer = main.spawn_renderer();

    assert_eq!(Role::detect(&main), Role::Main);
    assert_eq!(Role::detect(renderer.as_ref()), Role::Renderer);
}

#[test]
fn given_spawned_renderers_when_inspected_then_ids_are_sequential() {
    let main = LocalIpcMain::default();

    let ids: Vec<RendererId> = (0..3).map(|_| main.spawn_renderer().id()).collect();

    assert_eq!(ids, vec![RendererId(1), RendererId(2), RendererId(3)]);
}

/// **VALUE**: Verifies renderer sends reach main with the sender attached.
///
/// **WHY THIS MATTERS**: The sender context is the only way main can reply.
///
/// **BUG THIS CATCHES**: Would catch events delivered to main without a sender.
#[test]
fn given_renderer_send_when_main_listens_then_event_carries_sender() {
    let main = LocalIpcMain::new();
    let renderer = main.spawn_renderer();
    let (listener, received) = recording_listener();
    main.on("chan", listener);

    renderer
        .main_sender()
        .unwrap()
        .send("chan", &json!("hi"))
        .unwrap();

    assert_eq!(*received.borrow(), vec![(Some(renderer.id()), json!("hi"))]);
}

#[test]
fn given_main_send_to_web_contents_when_renderer_listens_then_event_has_no_sender() {
    let main = LocalIpcMain::new();
    let renderer = main.spawn_renderer();
    let (listener, received) = recording_listener();
    renderer.on("chan", listener);

    renderer.web_contents().send("chan", &json!(1)).unwrap();
    renderer.web_contents().send("other", &json!(2)).unwrap();

    assert_eq!(*received.borrow(), vec![(None, json!(1))]);
}

#[test]
fn given_removed_listener_when_sending_then_not_invoked() {
    let main = LocalIpcMain::new();
    let renderer = main.spawn_renderer();
    let (listener, received) = recording_listener();
    main.on("chan", Rc::clone(&listener));
    assert_eq!(main.listener_count("chan"), 1);

    main.remove_listener("chan", &listener);
    renderer
        .main_sender()
        .unwrap()
        .send("chan", &json!(1))
        .unwrap();

    assert_eq!(main.listener_count("chan"), 0);
    assert!(received.borrow().is_empty());
}

/// **VALUE**: Verifies a listener may unsubscribe itself while being dispatched.
///
/// **WHY THIS MATTERS**: Proxy libraries commonly detach a one-shot handler from inside
/// that handler.
///
/// **BUG THIS CATCHES**: Would catch dispatch holding the listener table borrowed
/// (a `BorrowMutError` panic).
#[test]
fn given_listener_removing_itself_when_dispatched_then_no_panic() {
    let main = Rc::new(LocalIpcMain::new());
    let renderer = main.spawn_renderer();
    let slot: Rc<RefCell<Option<IpcListener>>> = Rc::new(RefCell::new(None));

    let bus = Rc::clone(&main);
    let own = Rc::clone(&slot);
    let listener: IpcListener = Rc::new(move |_: &IpcEvent, _: &Value| {
        if let Some(me) = own.borrow_mut().take() {
            bus.remove_listener("chan", &me);
        }
    });
    *slot.borrow_mut() = Some(Rc::clone(&listener));
    main.on("chan", listener);

    renderer
        .main_sender()
        .unwrap()
        .send("chan", &json!(null))
        .unwrap();

    assert_eq!(main.listener_count("chan"), 0);
}

#[test]
fn given_destroyed_renderer_when_sending_either_way_then_disconnected() {
    let main = LocalIpcMain::new();
    let renderer = main.spawn_renderer();
    renderer.destroy();

    let to_main = renderer.main_sender().unwrap().send("chan", &json!(1));
    let to_renderer = renderer.web_contents().send("chan", &json!(1));

    assert!(matches!(to_main, Err(TransportError::Disconnected { .. })));
    match to_renderer {
        Err(TransportError::Disconnected { renderer: id, .. }) => assert_eq!(id, renderer.id()),
        other => panic!("Expected Disconnected, got {other:?}"),
    }
}
