//! Logging for the bridge host.
//!
//! Dual output (coloured stdout + plain file) with thread-safe, once-only
//! initialization. The level comes from `BridgeConfig::log_level`.

use crate::APP_NAME;
use crate::error::BridgeError;

use common::ErrorLocation;

use std::io::stdout;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use const_format::concatcp;
use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = concatcp!(APP_NAME, ".log");

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

/// Initialize the logger with dual output (stdout + `{log_dir}/ipc-bridge.log`).
///
/// Safe to call more than once: later calls log a warning and return Ok.
///
/// # Errors
///
/// Returns [`BridgeError::Bridge`] if the log file cannot be created or the
/// dispatcher cannot be installed.
pub fn initialize(log_dir: &Path, level: LevelFilter) -> Result<(), BridgeError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir, level);
        if result.is_ok() {
            info!("Logger initialized with level: {level:?}");
        }
    });

    result
}

fn record_line(
    out: fern::FormatCallback,
    message: &std::fmt::Arguments,
    record: &log::Record,
    level: &dyn std::fmt::Display,
) {
    out.finish(format_args!(
        "[{date} - {level}] {target}: {message} [{file}:{line}]",
        date = format_rfc3339(SystemTime::now()),
        target = record.target(),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}

#[track_caller]
fn initialize_internal(log_dir: &Path, level: LevelFilter) -> Result<(), BridgeError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let base_dispatch = Dispatch::new().level(level);

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            record_line(
                out,
                message,
                record,
                &color_configuration.color(record.level()),
            )
        })
        .chain(stdout());

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| record_line(out, message, record, &record.level()))
        .chain(
            fern::log_file(&log_file_path).map_err(|e| BridgeError::Bridge {
                message: format!("Failed to create log file: {e}"),
                location: ErrorLocation::caller(),
            })?,
        );

    base_dispatch
        .chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| BridgeError::Bridge {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::caller(),
        })?;

    Ok(())
}
