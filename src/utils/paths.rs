//! Application data directory resolution
//!
//! Everything WalletSwitch writes on its own behalf (settings, logs)
//! lives under a single directory in the user's roaming profile.

use std::path::PathBuf;

/// Directory name under `%APPDATA%` that holds settings and logs
pub const APP_DIR_NAME: &str = "WalletSwitch";

/// Root directory for application data
///
/// Returns `%APPDATA%\WalletSwitch`. Falls back to the current directory
/// when `APPDATA` is not set.
pub fn app_data_dir() -> PathBuf {
    let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(appdata).join(APP_DIR_NAME)
}
