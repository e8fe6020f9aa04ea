//! Demo host wiring endpoints end to end over the in-process transport.
//!
//! One main process and a few renderers exchange requests in both directions:
//!
//! - **Forward**: main exposes a calculator. Every renderer sends a request
//!   before main answers any of them, so the replies ride the FIFO sender queue.
//! - **Reverse**: each renderer exposes a description of itself. Main calls
//!   them one at a time through an endpoint pinned to that renderer.
//!
//! The request format is a stand-in for a real remote-proxy protocol.

use crate::error::BridgeError;

use common::ErrorLocation;

use ipc_endpoint::config::BridgeConfig;
use ipc_endpoint::transport::local::{LocalIpcMain, LocalIpcRenderer};
use ipc_endpoint::{
    Endpoint, EndpointError, EventHandler, IpcEndpoint, IpcTransport, MessageEvent, RendererId,
};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Logical channel both directions register on.
pub const SERVICE_CHANNEL: &str = "message";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "snake_case")]
pub enum Request {
    Add(i64, i64),
    Describe,
}

/// One request and the response it got.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub renderer: RendererId,
    pub request: Value,
    pub response: Value,
}

#[derive(Debug, Default, Serialize)]
pub struct BridgeReport {
    pub forward: Vec<Exchange>,
    pub reverse: Vec<Exchange>,
}

/// An endpoint plus a queue of everything delivered to it.
pub struct Mailbox<T: IpcTransport + ?Sized> {
    endpoint: IpcEndpoint<T>,
    inbox: Rc<RefCell<VecDeque<Value>>>,
    handler: EventHandler,
}

impl<T: IpcTransport + ?Sized> Mailbox<T> {
    /// Subscribe `endpoint` on [`SERVICE_CHANNEL`].
    pub fn open(endpoint: IpcEndpoint<T>) -> Result<Self, EndpointError> {
        let inbox = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&inbox);
        let handler: EventHandler = Rc::new(move |event: &MessageEvent| {
            sink.borrow_mut().push_back(event.data.clone());
        });
        endpoint.add_event_listener(SERVICE_CHANNEL, Rc::clone(&handler))?;

        Ok(Self {
            endpoint,
            inbox,
            handler,
        })
    }

    pub fn endpoint(&self) -> &IpcEndpoint<T> {
        &self.endpoint
    }

    pub fn post(&self, message: Value) -> Result<(), EndpointError> {
        self.endpoint.post_message(message, &[])
    }

    /// Take everything received so far, oldest first.
    pub fn drain(&self) -> Vec<Value> {
        self.inbox.borrow_mut().drain(..).collect()
    }

    /// Answer every queued message in arrival order. Returns how many were answered.
    pub fn answer(&self, respond: impl Fn(&Value) -> Value) -> Result<usize, EndpointError> {
        let requests = self.drain();
        for request in &requests {
            self.post(respond(request))?;
        }
        Ok(requests.len())
    }

    pub fn close(&self) -> Result<(), EndpointError> {
        self.endpoint
            .remove_event_listener(SERVICE_CHANNEL, &self.handler)
    }
}

/// Main-side calculator.
pub fn evaluate(request: &Value) -> Value {
    match serde_json::from_value::<Request>(request.clone()) {
        Ok(Request::Add(a, b)) => json!({ "result": a.saturating_add(b) }),
        Ok(Request::Describe) => json!({ "error": "describe is served by renderers" }),
        Err(e) => json!({ "error": e.to_string() }),
    }
}

fn describe(renderer: &LocalIpcRenderer) -> Value {
    json!({ "result": format!("window {}", renderer.id()) })
}

#[track_caller]
fn single_response(renderer: RendererId, mut responses: Vec<Value>) -> Result<Value, BridgeError> {
    if responses.len() != 1 {
        return Err(BridgeError::Bridge {
            message: format!(
                "{renderer} expected exactly one response, got {}",
                responses.len()
            ),
            location: ErrorLocation::caller(),
        });
    }
    Ok(responses.remove(0))
}

/// Run the demo with `renderer_count` renderers.
///
/// # Errors
///
/// Returns [`BridgeError::Core`] if any endpoint operation fails and
/// [`BridgeError::Bridge`] if a caller does not get exactly one response.
pub fn run(config: &BridgeConfig, renderer_count: u32) -> Result<BridgeReport, BridgeError> {
    let channels = &config.channels;
    let main = Rc::new(LocalIpcMain::new());
    let renderers: Vec<Rc<LocalIpcRenderer>> =
        (0..renderer_count).map(|_| main.spawn_renderer()).collect();
    info!("Bridge running with {} renderer(s)", renderers.len());

    let mut report = BridgeReport::default();

    // Forward: main's calculator, all requests in flight before any reply.
    let calculator = Mailbox::open(channels.forward_endpoint(&main))?;
    info!(
        "Main exposes calculator on {}",
        calculator.endpoint().channel()?
    );

    let clients = renderers
        .iter()
        .map(|renderer| Mailbox::open(channels.forward_endpoint(renderer)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut requests = Vec::with_capacity(clients.len());
    for (client, renderer) in clients.iter().zip(&renderers) {
        let n = i64::from(renderer.id().0);
        let request = serde_json::to_value(Request::Add(n, n * 10)).map_err(|e| {
            BridgeError::Bridge {
                message: format!("Failed to encode request: {e}"),
                location: ErrorLocation::caller(),
            }
        })?;
        client.post(request.clone())?;
        requests.push(request);
    }
    debug!(
        "Calculator has {} pending sender(s)",
        calculator.endpoint().pending_sender_count()
    );

    let answered = calculator.answer(evaluate)?;
    info!("Calculator answered {answered} request(s)");

    for ((client, renderer), request) in clients.iter().zip(&renderers).zip(requests) {
        report.forward.push(Exchange {
            renderer: renderer.id(),
            request,
            response: single_response(renderer.id(), client.drain())?,
        });
    }

    // Reverse: each renderer describes itself; main asks one renderer at a time.
    let services = renderers
        .iter()
        .map(|renderer| Mailbox::open(channels.reverse_endpoint(renderer, None)))
        .collect::<Result<Vec<_>, _>>()?;

    for (service, renderer) in services.iter().zip(&renderers) {
        let caller = Mailbox::open(channels.reverse_endpoint(&main, Some(renderer.web_contents())))?;
        let request = json!({ "method": "describe" });
        caller.post(request.clone())?;
        service.answer(|_| describe(renderer))?;

        report.reverse.push(Exchange {
            renderer: renderer.id(),
            request,
            response: single_response(renderer.id(), caller.drain())?,
        });

        // Every main-side reverse caller shares one wire channel; detach before the next.
        caller.close()?;
    }

    info!(
        "Bridge finished: {} forward, {} reverse exchange(s)",
        report.forward.len(),
        report.reverse.len()
    );
    Ok(report)
}
