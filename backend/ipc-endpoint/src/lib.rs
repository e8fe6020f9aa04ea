pub mod config;
pub mod endpoint;
pub mod error;
pub mod factory;
pub mod transport;


pub use endpoint::{
    CHANNEL_PREFIX, Endpoint, EventHandler, FORWARD_SUFFIX, IpcEndpoint, MessageEvent,
    REVERSE_SUFFIX, Role, create_endpoint,
};
pub use error::endpoint::EndpointError;
pub use error::transport::TransportError;
pub use factory::{main_proc_object_endpoint, renderer_proc_object_endpoint};
pub use transport::{
    IpcEvent, IpcListener, IpcTransport, MainSender, RendererId, RendererTarget, SenderContext,
};
