//! Error types for the `WalletSwitch` application
//!
//! This module defines all error types used throughout the application,
//! providing clear error messages and proper error propagation.
//!
//! Error variants use `#[source]` to preserve error chains for better
//! observability and debugging.

use std::time::Duration;

use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Main error type for the `WalletSwitch` application
#[derive(Debug, Error)]
pub enum WalletSwitchError {
    /// The user cancelled an interactive path prompt.
    ///
    /// This is a clean-shutdown signal rather than a failure: callers
    /// translate it into a normal process exit.
    #[error("Path selection cancelled by user")]
    UserAborted,

    /// Another instance of the application is already running
    #[error("Another instance of WalletSwitch is already running")]
    AlreadyRunning,

    /// Failed to start the wallet process
    /// Preserves the underlying spawn error for full error chain transparency
    #[error("Failed to start wallet process: {0}")]
    LaunchFailed(#[source] std::io::Error),

    /// The running wallet process did not confirm its exit in time.
    ///
    /// No replacement process has been started; the old instance may
    /// still be running.
    #[error("Wallet process did not confirm exit within {timeout:?}")]
    ExitNotConfirmed {
        /// How long the supervisor waited for the exit notification
        timeout: Duration,
    },

    /// Settings load/save error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Settings error: {0}")]
    SettingsError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Logging initialization error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Logging error: {0}")]
    LoggingError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Process table query error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Process table error: {0}")]
    ProcessTableError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Tray icon or menu construction error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Tray menu error: {0}")]
    TrayError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Windows API error
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApiError(#[from] windows::core::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for `WalletSwitch` operations
pub type Result<T> = std::result::Result<T, WalletSwitchError>;

/// Convert an error to a user-friendly message
///
/// This function takes a `WalletSwitchError` and returns a message suitable
/// for displaying to end users in error dialogs.
///
/// The messages include troubleshooting hints to help users resolve
/// common issues.
pub fn get_user_friendly_error(error: &WalletSwitchError) -> String {
    match error {
        WalletSwitchError::UserAborted => "No path was selected.\n\n\
             WalletSwitch needs to know where the wallet application\n\
             and its data folder are before it can switch wallets."
            .to_string(),
        WalletSwitchError::AlreadyRunning => "WalletSwitch is already running.\n\n\
             Look for its icon in the system tray."
            .to_string(),
        WalletSwitchError::LaunchFailed(e) => {
            format!(
                "Could not start the wallet application:\n\n{e}\n\n\
                 The previous instance has already been closed.\n\
                 Verify the executable still exists, then pick a wallet\n\
                 from the tray menu to try again."
            )
        }
        WalletSwitchError::ExitNotConfirmed { timeout } => {
            format!(
                "The running wallet did not shut down within {timeout:?}.\n\n\
                 No new instance was started.\n\
                 Close the wallet manually, then pick a wallet\n\
                 from the tray menu to try again."
            )
        }
        WalletSwitchError::SettingsError(_) => "Failed to load or save settings.\n\n\
             Your path choices may not persist.\n\
             Check that you have write permissions to:\n\
             %APPDATA%\\WalletSwitch"
            .to_string(),
        WalletSwitchError::LoggingError(_) => "Failed to initialize logging.\n\n\
             WalletSwitch will continue without a log file.\n\
             Check that you have write permissions to:\n\
             %APPDATA%\\WalletSwitch"
            .to_string(),
        WalletSwitchError::ProcessTableError(_) => "Failed to inspect running processes.\n\n\
             Switching wallets may not work correctly.\n\
             Try restarting WalletSwitch."
            .to_string(),
        WalletSwitchError::TrayError(_) => "Failed to build the tray icon or menu.\n\n\
             Try restarting WalletSwitch."
            .to_string(),
        #[cfg(windows)]
        WalletSwitchError::WindowsApiError(e) => {
            format!(
                "A Windows API error occurred:\n\n{e}\n\n\
                 Please ensure your Windows installation is up to date."
            )
        }
        WalletSwitchError::IoError(e) => {
            format!(
                "A file system error occurred:\n\n{e}\n\n\
                 Please check file permissions and disk space."
            )
        }
        WalletSwitchError::JsonError(e) => {
            format!(
                "Settings file is corrupted:\n\n{e}\n\n\
                 The application will use default settings."
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = WalletSwitchError::UserAborted;
        assert_eq!(error.to_string(), "Path selection cancelled by user");
    }

    #[test]
    fn test_exit_not_confirmed_display() {
        let error = WalletSwitchError::ExitNotConfirmed {
            timeout: Duration::from_secs(30),
        };
        assert_eq!(
            error.to_string(),
            "Wallet process did not confirm exit within 30s"
        );
    }

    #[test]
    fn test_launch_failed_preserves_source() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error = WalletSwitchError::LaunchFailed(io_error);
        assert!(error.to_string().contains("Failed to start wallet process"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: WalletSwitchError = io_error.into();
        assert!(matches!(error, WalletSwitchError::IoError(_)));
    }

    #[test]
    fn test_settings_error_display() {
        let error = WalletSwitchError::SettingsError(StringError::new("test error"));
        assert_eq!(error.to_string(), "Settings error: test error");
    }

    #[test]
    fn test_user_friendly_exit_not_confirmed() {
        let error = WalletSwitchError::ExitNotConfirmed {
            timeout: Duration::from_secs(30),
        };
        let message = get_user_friendly_error(&error);
        assert!(message.contains("did not shut down"));
        assert!(message.contains("No new instance was started"));
    }

    #[test]
    fn test_user_friendly_launch_failed() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error = WalletSwitchError::LaunchFailed(io_error);
        let message = get_user_friendly_error(&error);
        assert!(message.contains("Could not start the wallet application"));
        assert!(message.contains("no such file"));
    }

    #[test]
    fn test_user_friendly_settings_error() {
        let error = WalletSwitchError::SettingsError(StringError::new("disk full"));
        let message = get_user_friendly_error(&error);
        assert!(message.contains("WalletSwitch"));
        assert!(message.contains("write permissions"));
    }
}
