use ipc_bridge::bridge::{Mailbox, run};

use ipc_endpoint::RendererId;
use ipc_endpoint::config::{BridgeConfig, ChannelsConfig};
use ipc_endpoint::transport::local::LocalIpcMain;

use std::rc::Rc;

use serde_json::json;

// ============================================================================
// Integration tests for the bridge host over the in-process transport
// ============================================================================

/// **VALUE**: Tests the whole demo: forward calls from every renderer, reverse calls
/// from main to every renderer.
///
/// **WHY THIS MATTERS**: This is the closest thing to running the binary. It exercises
/// FIFO reply routing with several renderers in flight at once.
///
/// **BUG THIS CATCHES**: Would catch replies landing at the wrong renderer (each
/// renderer's answer encodes its own id).
#[test]
fn given_default_config_when_running_then_every_renderer_gets_its_answers() {
    // GIVEN: Default config, three renderers
    let config = BridgeConfig::default();

    // WHEN: Running the bridge
    let report = run(&config, 3).expect("bridge run should succeed");

    // THEN: Forward answers are per-renderer sums
    assert_eq!(report.forward.len(), 3);
    for exchange in &report.forward {
        let n = i64::from(exchange.renderer.0);
        assert_eq!(exchange.response, json!({"result": n + n * 10}));
    }

    // AND: Reverse answers name the renderer that was asked
    let described: Vec<_> = report
        .reverse
        .iter()
        .map(|exchange| (exchange.renderer, exchange.response.clone()))
        .collect();
    assert_eq!(
        described,
        vec![
            (RendererId(1), json!({"result": "window renderer#1"})),
            (RendererId(2), json!({"result": "window renderer#2"})),
            (RendererId(3), json!({"result": "window renderer#3"})),
        ]
    );
}

#[test]
fn given_custom_suffixes_when_running_then_still_routes() {
    let config = BridgeConfig {
        channels: ChannelsConfig {
            forward_suffix: "_fwd".to_string(),
            reverse_suffix: "_rev".to_string(),
        },
        ..BridgeConfig::default()
    };

    let report = run(&config, 2).unwrap();

    assert_eq!(report.forward.len(), 2);
    assert_eq!(report.reverse.len(), 2);
}

#[test]
fn given_no_renderers_when_running_then_empty_report() {
    let report = run(&BridgeConfig::default(), 0).unwrap();

    assert!(report.forward.is_empty());
    assert!(report.reverse.is_empty());
}

/// **VALUE**: Verifies a closed mailbox no longer receives messages.
///
/// **WHY THIS MATTERS**: The reverse loop relies on closing each main-side caller
/// before opening the next on the same wire channel.
///
/// **BUG THIS CATCHES**: Would catch `close()` leaving the subscription attached.
#[test]
fn given_closed_mailbox_when_message_arrives_then_not_queued() {
    let main = Rc::new(LocalIpcMain::new());
    let renderer = main.spawn_renderer();
    let channels = ChannelsConfig::default();

    let server = Mailbox::open(channels.forward_endpoint(&main)).unwrap();
    let client = Mailbox::open(channels.forward_endpoint(&renderer)).unwrap();

    server.close().unwrap();
    client.post(json!("ping")).unwrap();

    assert!(server.drain().is_empty());
    assert_eq!(server.endpoint().pending_sender_count(), 0);
}
