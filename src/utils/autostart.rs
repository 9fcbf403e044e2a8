//! Auto-start registry management
//!
//! Registers the application under the per-user `Run` key so Windows
//! launches it at logon. All operations target `HKEY_CURRENT_USER` and
//! need no elevation.

use std::path::Path;

#[cfg(windows)]
use std::io::ErrorKind;

#[cfg(windows)]
use winreg::RegKey;
#[cfg(windows)]
use winreg::enums::{HKEY_CURRENT_USER, KEY_SET_VALUE};

use crate::error::Result;

/// Registry value name identifying this application under the `Run` key
#[cfg(windows)]
const RUN_VALUE_NAME: &str = "WalletSwitch";

/// Per-user `Run` key consulted by Windows at logon
#[cfg(windows)]
const RUN_KEY_PATH: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// Auto-start manager
pub struct AutoStartManager;

#[cfg(windows)]
impl AutoStartManager {
    /// Check if auto-start is enabled
    ///
    /// # Errors
    ///
    /// Returns an error when the registry cannot be read. A missing
    /// `Run` key or value is reported as disabled, not as an error.
    pub fn is_enabled() -> Result<bool> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let run_key = match hkcu.open_subkey(RUN_KEY_PATH) {
            Ok(key) => key,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        match run_key.get_value::<String, _>(RUN_VALUE_NAME) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Enable auto-start for the current executable
    ///
    /// # Errors
    ///
    /// Returns an error when the current executable path cannot be
    /// determined or the registry value cannot be written.
    pub fn enable() -> Result<()> {
        let executable = std::env::current_exe()?;
        let command = launch_command(&executable);

        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (run_key, _) = hkcu.create_subkey(RUN_KEY_PATH)?;
        run_key.set_value(RUN_VALUE_NAME, &command)?;

        tracing::info!("Auto-start enabled: {command}");
        Ok(())
    }

    /// Disable auto-start
    ///
    /// # Errors
    ///
    /// Returns an error when the registry value exists but cannot be
    /// deleted. Already-disabled is not an error.
    pub fn disable() -> Result<()> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let run_key = match hkcu.open_subkey_with_flags(RUN_KEY_PATH, KEY_SET_VALUE) {
            Ok(key) => key,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        match run_key.delete_value(RUN_VALUE_NAME) {
            Ok(()) => {
                tracing::info!("Auto-start disabled");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(not(windows))]
impl AutoStartManager {
    /// Check if auto-start is enabled (stub for non-Windows)
    ///
    /// # Errors
    ///
    /// Never fails on non-Windows platforms.
    pub fn is_enabled() -> Result<bool> {
        Ok(false)
    }

    /// Enable auto-start (stub for non-Windows)
    ///
    /// # Errors
    ///
    /// Never fails on non-Windows platforms.
    pub fn enable() -> Result<()> {
        Ok(())
    }

    /// Disable auto-start (stub for non-Windows)
    ///
    /// # Errors
    ///
    /// Never fails on non-Windows platforms.
    pub fn disable() -> Result<()> {
        Ok(())
    }
}

/// Quoted command line stored under the `Run` key
///
/// Quoting keeps paths with spaces intact when Windows parses the value.
#[cfg_attr(not(windows), allow(dead_code))]
fn launch_command(executable: &Path) -> String {
    format!("\"{}\"", executable.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_command_quotes_the_executable_path() {
        let command = launch_command(Path::new(r"C:\Program Files\WalletSwitch\walletswitch.exe"));
        assert_eq!(
            command,
            r#""C:\Program Files\WalletSwitch\walletswitch.exe""#
        );
    }

    #[test]
    #[cfg(windows)]
    fn is_enabled_reads_the_registry_without_error() {
        // Read-only probe; passes whether or not the value exists.
        assert!(AutoStartManager::is_enabled().is_ok());
    }
}
