//! Shared building blocks for the IPC bridge workspace.
//!
//! ## Architecture
//!
//! - **common** (this crate): types every other crate reports errors with
//! - **ipc-endpoint**: the endpoint adapter and host transport traits
//! - **ipc-bridge**: application wiring (logging, config, demo host)

mod location;


pub use location::ErrorLocation;
