//! Logging system initialization
//!
//! Sets up tracing-based logging with file output to
//! `%APPDATA%\WalletSwitch\app.log` and automatic rotation on startup
//! keeping the last sessions as numbered history files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{Result, WalletSwitchError};
use crate::utils::paths;

/// Name of the active log file
const LOG_FILE_NAME: &str = "app.log";

/// Highest numbered history file kept (`app.log.1` through `app.log.9`)
const MAX_LOG_HISTORY: u8 = 9;

/// Initialize the logging system
///
/// The log level defaults to INFO and can be overridden through the
/// `RUST_LOG` environment variable. Existing logs are rotated first so
/// each session writes into a fresh file.
///
/// # Errors
///
/// Returns an error when the log directory cannot be created, rotation
/// fails, or a global subscriber has already been installed.
pub fn init_logging() -> Result<()> {
    let log_dir = paths::app_data_dir();
    fs::create_dir_all(&log_dir)?;

    rotate_on_startup(&log_dir)?;

    // tracing-appender's own rotation is time-based, which does not map
    // onto per-session history files, so rotation happens above and the
    // appender itself never rotates.
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("app")
        .filename_suffix("log")
        .build(&log_dir)
        .map_err(|e| WalletSwitchError::LoggingError(Box::new(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| WalletSwitchError::LoggingError(Box::new(e)))?;

    tracing::info!(
        "WalletSwitch v{} logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_dir.join(LOG_FILE_NAME).display()
    );

    Ok(())
}

/// Rotate log files so each session gets its own file
///
/// `app.log.9` is deleted, every `app.log.N` moves to `app.log.N+1`,
/// and the previous session's `app.log` becomes `app.log.1`. Runs on
/// every startup regardless of file sizes.
fn rotate_on_startup(log_dir: &Path) -> Result<()> {
    let current = log_dir.join(LOG_FILE_NAME);
    if !current.exists() {
        return Ok(());
    }

    let oldest = numbered_log(log_dir, MAX_LOG_HISTORY);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }

    for index in (1..MAX_LOG_HISTORY).rev() {
        let from = numbered_log(log_dir, index);
        if from.exists() {
            fs::rename(&from, numbered_log(log_dir, index + 1))?;
        }
    }

    fs::rename(&current, numbered_log(log_dir, 1))?;

    Ok(())
}

fn numbered_log(log_dir: &Path, index: u8) -> PathBuf {
    log_dir.join(format!("{LOG_FILE_NAME}.{index}"))
}
