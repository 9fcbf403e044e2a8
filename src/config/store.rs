//! Settings store for loading and saving persisted paths
//!
//! Settings live in a single JSON file, by default
//! `%APPDATA%\WalletSwitch\settings.json`, written atomically to prevent
//! corruption. The file location is explicit on the store so components
//! (and tests) can point it anywhere.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::models::Settings;
use crate::error::{Result, StringError, WalletSwitchError};
use crate::utils::paths;

/// File name of the settings file inside the application data directory
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Settings store bound to one JSON file
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store bound to the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default settings location: `%APPDATA%\WalletSwitch\settings.json`
    pub fn default_path() -> PathBuf {
        paths::app_data_dir().join(SETTINGS_FILE_NAME)
    }

    /// Create a store bound to the default settings location
    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings from disk
    ///
    /// A missing or unparseable file yields default settings; the next
    /// save replaces it.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            info!("Settings file not found, using defaults");
            return Ok(Settings::default());
        }

        let json = fs::read_to_string(&self.path)?;

        match serde_json::from_str(&json) {
            Ok(settings) => {
                info!("Settings loaded from {}", self.path.display());
                Ok(settings)
            }
            Err(e) => {
                warn!("Failed to parse settings, using defaults: {e}");
                Ok(Settings::default())
            }
        }
    }

    /// Save settings to disk with an atomic write
    ///
    /// Writes to a temporary file in the same directory, then persists it
    /// over the target path so a crash never leaves a half-written file.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let dir = self.path.parent().ok_or_else(|| {
            WalletSwitchError::SettingsError(StringError::new(format!(
                "settings path has no parent directory: {}",
                self.path.display()
            )))
        })?;
        fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(settings)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.persist(&self.path)
            .map_err(|e| WalletSwitchError::IoError(e.error))?;

        info!("Settings saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_under_app_dir() {
        let path = SettingsStore::default_path();
        assert!(path.to_string_lossy().contains("WalletSwitch"));
        assert!(path.to_string_lossy().ends_with("settings.json"));
    }

    #[test]
    fn test_load_missing_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let settings = Settings {
            wallet_exec: Some(PathBuf::from(r"C:\Wallet\dogecoin-qt.exe")),
            data_dir: Some(PathBuf::from(r"C:\Data\DogeCoin")),
            ..Settings::default()
        };
        store.save(&settings).unwrap();

        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_load_corrupt_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not valid json").unwrap();

        let store = SettingsStore::new(path);
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));
        store.save(&Settings::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        store.save(&Settings::default()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("settings.json")]);
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let first = Settings {
            wallet_exec: Some(PathBuf::from(r"C:\old\dogecoin-qt.exe")),
            ..Settings::default()
        };
        store.save(&first).unwrap();

        let second = Settings {
            wallet_exec: Some(PathBuf::from(r"C:\new\dogecoin-qt.exe")),
            ..Settings::default()
        };
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap(), second);
    }
}
