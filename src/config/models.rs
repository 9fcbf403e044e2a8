//! Settings data models
//!
//! This module defines the data structures persisted by the settings store:
//! the resolved wallet paths and the description of the wallet application
//! being managed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Description of the wallet application being managed
///
/// The defaults describe Dogecoin Core (`dogecoin-qt`). Overriding these
/// fields in the settings file repoints WalletSwitch at another
/// Bitcoin-style wallet that uses the same data directory layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetApp {
    /// Process name without extension, matched case-insensitively
    pub process_name: String,
    /// Install directory name under `%ProgramFiles(x86)%`
    pub install_dir_name: String,
    /// Data directory name under `%APPDATA%`
    pub data_dir_name: String,
}

impl TargetApp {
    /// Executable file name, e.g. `dogecoin-qt.exe`
    pub fn executable_file_name(&self) -> String {
        format!("{}.exe", self.process_name)
    }

    /// Conventional install path: `%ProgramFiles(x86)%\<install dir>\<exe>`
    pub fn default_executable_path(&self) -> PathBuf {
        let program_files = std::env::var("ProgramFiles(x86)")
            .unwrap_or_else(|_| r"C:\Program Files (x86)".to_string());
        PathBuf::from(program_files)
            .join(&self.install_dir_name)
            .join(self.executable_file_name())
    }

    /// Conventional data directory: `%APPDATA%\<data dir>`
    pub fn default_data_dir(&self) -> PathBuf {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join(&self.data_dir_name)
    }
}

impl Default for TargetApp {
    fn default() -> Self {
        Self {
            process_name: "dogecoin-qt".to_string(),
            install_dir_name: "Dogecoin".to_string(),
            data_dir_name: "DogeCoin".to_string(),
        }
    }
}

/// Top-level persisted settings
///
/// `wallet_exec` and `data_dir` are `None` until path resolution has
/// succeeded once; both are revalidated on every startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Last known path to the wallet executable
    pub wallet_exec: Option<PathBuf>,
    /// Last known path to the wallet data directory
    pub data_dir: Option<PathBuf>,
    /// The wallet application being managed
    pub target: TargetApp,
}
