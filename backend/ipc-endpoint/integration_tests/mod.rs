mod endpoint;
mod error;
mod transport;
