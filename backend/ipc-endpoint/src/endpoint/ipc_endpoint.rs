use crate::endpoint::channel::ChannelName;
use crate::endpoint::handler_map::HandlerMap;
use crate::endpoint::role::Role;
use crate::endpoint::transfer::validate_transferables;
use crate::endpoint::{Endpoint, EventHandler, MessageEvent};
use crate::error::endpoint::EndpointError;
use crate::error::transport::TransportError;
use crate::transport::{
    IpcEvent, IpcListener, IpcTransport, RendererId, RendererTarget, SenderContext,
};

use common::ErrorLocation;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, trace, warn};
use serde_json::Value;

/// Endpoint over a shared host transport.
///
/// Created per (transport, suffix, fixed target). The transport and target are
/// shared with the host; the endpoint performs no teardown of its own. Holding
/// the transport by `Rc` lets a handler capture its own endpoint (weakly) and
/// reply from inside the dispatch.
pub struct IpcEndpoint<T: IpcTransport + ?Sized> {
    transport: Rc<T>,
    role: Role,
    channel: ChannelName,
    handlers: HandlerMap,
    /// Inbound senders awaiting a reply. Only filled in main role without a
    /// fixed target.
    pending_senders: Rc<RefCell<VecDeque<SenderContext>>>,
    target: Option<Rc<dyn RendererTarget>>,
}

/// Build an endpoint for `transport`.
///
/// `suffix` separates independent endpoints sharing one transport. `target`
/// pins main-role replies to one renderer; renderer handles ignore it.
pub fn create_endpoint<T: IpcTransport + ?Sized>(
    transport: &Rc<T>,
    suffix: &str,
    target: Option<Rc<dyn RendererTarget>>,
) -> IpcEndpoint<T> {
    IpcEndpoint::new(Rc::clone(transport), suffix, target)
}

impl<T: IpcTransport + ?Sized> IpcEndpoint<T> {
    pub fn new(transport: Rc<T>, suffix: &str, target: Option<Rc<dyn RendererTarget>>) -> Self {
        let role = Role::detect(&*transport);

        let target = match (role, target) {
            (Role::Renderer, Some(ignored)) => {
                warn!(
                    "Fixed target {} ignored: renderer endpoints always send to main",
                    ignored.id()
                );
                None
            }
            (_, target) => target,
        };

        debug!(
            "Created {role} endpoint (suffix '{suffix}', fixed target: {})",
            target
                .as_ref()
                .map_or_else(|| "none".to_string(), |t| t.id().to_string())
        );

        Self {
            transport,
            role,
            channel: ChannelName::new(suffix),
            handlers: HandlerMap::default(),
            pending_senders: Rc::new(RefCell::new(VecDeque::new())),
            target,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Logical channel registered by the consuming library, if any.
    pub fn channel_identifier(&self) -> Option<String> {
        self.channel.identifier()
    }

    /// Resolved wire channel.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::MissingIdentifier`] before the first listener is registered.
    #[track_caller]
    pub fn channel(&self) -> Result<String, EndpointError> {
        self.channel.resolve()
    }

    pub fn fixed_target(&self) -> Option<RendererId> {
        self.target.as_ref().map(|target| target.id())
    }

    pub fn pending_sender_count(&self) -> usize {
        self.pending_senders.borrow().len()
    }

    /// Renderers with a queued request, oldest first.
    pub fn pending_senders(&self) -> Vec<RendererId> {
        self.pending_senders
            .borrow()
            .iter()
            .map(SenderContext::id)
            .collect()
    }

    /// Number of handlers currently subscribed through this endpoint.
    pub fn handler_count(&self) -> usize {
        self.handlers.live_count()
    }

    fn queues_senders(&self) -> bool {
        self.role == Role::Main && self.target.is_none()
    }

    fn wrap(&self, handler: EventHandler) -> IpcListener {
        let pending = self
            .queues_senders()
            .then(|| Rc::clone(&self.pending_senders));

        Rc::new(move |event: &IpcEvent, data: &Value| {
            if let Some(pending) = &pending {
                match event.sender() {
                    Some(sender) => {
                        trace!("Queued reply path to {}", sender.id());
                        pending.borrow_mut().push_back(sender.clone());
                    }
                    None => warn!("Inbound event has no sender; its reply cannot be routed"),
                }
            }
            handler(&MessageEvent::new(data.clone(), event.clone()));
        })
    }

    #[track_caller]
    fn send_to_main(&self, channel: &str, message: &Value) -> Result<(), EndpointError> {
        let sender = self
            .transport
            .main_sender()
            .ok_or_else(|| TransportError::Send {
                message: "renderer transport no longer exposes send-to-main".to_string(),
                location: ErrorLocation::caller(),
            })?;
        sender.send(channel, message)?;
        Ok(())
    }

    #[track_caller]
    fn reply_to_oldest_sender(&self, channel: &str, message: &Value) -> Result<(), EndpointError> {
        let sender = self
            .pending_senders
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| EndpointError::NoPendingSender {
                message: format!("no inbound request is waiting for a reply on {channel}"),
                location: ErrorLocation::caller(),
            })?;
        trace!("Replying to {} on {channel}", sender.id());
        sender.reply(channel, message)?;
        Ok(())
    }
}

impl<T: IpcTransport + ?Sized> Endpoint for IpcEndpoint<T> {
    #[track_caller]
    fn add_event_listener(&self, channel: &str, handler: EventHandler) -> Result<(), EndpointError> {
        self.channel.bind(channel)?;
        let wire = self.channel.resolve()?;

        if self.handlers.get(&handler).is_some() {
            debug!("Handler already subscribed on {wire}");
            return Ok(());
        }

        let listener = self.wrap(Rc::clone(&handler));
        self.handlers.insert(&handler, &listener);
        self.transport.on(&wire, listener);

        debug!("Subscribed {} endpoint handler on {wire}", self.role);
        Ok(())
    }

    #[track_caller]
    fn remove_event_listener(
        &self,
        channel: &str,
        handler: &EventHandler,
    ) -> Result<(), EndpointError> {
        self.channel.ensure_matches(channel)?;
        let wire = self.channel.resolve()?;

        match self.handlers.get(handler) {
            Some(listener) => {
                self.transport.remove_listener(&wire, &listener);
                debug!("Unsubscribed {} endpoint handler from {wire}", self.role);
            }
            None => debug!("Handler was not subscribed on {wire}, nothing to detach"),
        }
        Ok(())
    }

    #[track_caller]
    fn post_message(&self, message: Value, transferables: &[Value]) -> Result<(), EndpointError> {
        validate_transferables(transferables)?;
        let wire = self.channel.resolve()?;

        match (self.role, &self.target) {
            (Role::Renderer, _) => self.send_to_main(&wire, &message),
            (Role::Main, Some(target)) => {
                trace!("Sending to fixed target {} on {wire}", target.id());
                target.send(&wire, &message)?;
                Ok(())
            }
            (Role::Main, None) => self.reply_to_oldest_sender(&wire, &message),
        }
    }
}
