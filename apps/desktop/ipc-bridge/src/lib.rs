// Library exports for testing
// The binary (main.rs) imports these as well

pub mod bridge;
pub mod error;
pub mod logger;


/// Name used for the config directory and the log file.
pub const APP_NAME: &str = "ipc-bridge";
