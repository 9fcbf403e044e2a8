//! Settings management module
//!
//! This module handles loading, saving, and modelling persisted settings.
//! Settings are stored in %APPDATA%\WalletSwitch\settings.json with atomic
//! writes to prevent corruption.

pub mod models;
pub mod store;

pub use models::{Settings, TargetApp};
pub use store::SettingsStore;
