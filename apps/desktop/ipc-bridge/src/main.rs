use ipc_bridge::APP_NAME;
use ipc_bridge::bridge;
use ipc_bridge::error::BridgeError;
use ipc_bridge::logger::initialize as LoggerInitialize;

use ipc_endpoint::config::BridgeConfig;

use common::ErrorLocation;

use std::env::args_os;
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::process::ExitCode;

use log::info;

/// Renderers spawned by the demo run.
const RENDERER_COUNT: u32 = 3;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), BridgeError> {
    // Config directory: first argument, else the platform config dir
    let config_dir = match args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => dirs::config_dir()
            .ok_or_else(|| BridgeError::Bridge {
                message: "No platform config directory".to_string(),
                location: ErrorLocation::caller(),
            })?
            .join(APP_NAME),
    };

    // First run writes the defaults so later edits have a file to start from
    let config = BridgeConfig::load_or_create(&config_dir)?;

    let log_dir = config_dir.join("logs");
    create_dir_all(&log_dir).map_err(|e| BridgeError::Bridge {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::caller(),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir, config.level_filter()?)?;

    info!("IPC bridge starting");
    info!("Config directory: {}", config_dir.display());

    let report = bridge::run(&config, RENDERER_COUNT)?;

    let json = serde_json::to_string_pretty(&report).map_err(|e| BridgeError::Bridge {
        message: format!("Failed to serialize report: {e}"),
        location: ErrorLocation::caller(),
    })?;
    println!("{json}");

    Ok(())
}
