//! `WalletSwitch` - Dogecoin Core wallet switcher for Windows
//!
//! Tray utility that swaps which wallet file Dogecoin Core loads.
//! Resolves the wallet executable and data directory, lists the wallet
//! files it finds, and switches between them on request by closing the
//! running wallet and relaunching it with a `-wallet=` argument.

// Set Windows subsystem to hide console window
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Tray module is only in the binary, not the library
#[cfg(windows)]
mod tray;

use anyhow::{Context, Result};
use tracing::info;
use walletswitch::error::get_user_friendly_error;
use walletswitch::utils;

/// Main entry point for the application
///
/// Enforces single instance, initializes logging, then hands off to the
/// platform run loop.
fn main() -> Result<()> {
    // Single instance first: a second instance must not rotate the log
    // files the first one is still writing.
    let _single_instance_guard = match utils::SingleInstanceGuard::new() {
        Ok(guard) => guard,
        Err(e) => {
            show_error_and_exit(&get_user_friendly_error(&e));
            return Err(e.into());
        }
    };

    utils::init_logging().context("Failed to initialize logging system")?;

    info!("WalletSwitch v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Single instance check passed");

    run()
}

/// Resolve paths, scan wallets and run the tray until Exit
#[cfg(windows)]
fn run() -> Result<()> {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing::{error, warn};
    use walletswitch::catalog;
    use walletswitch::config::{Settings, SettingsStore};
    use walletswitch::error::WalletSwitchError;
    use walletswitch::resolver::{DialogPrompter, PathResolver};
    use walletswitch::supervisor::{SystemProcessTable, WalletSupervisor};

    let store = SettingsStore::open_default();
    let mut settings = match store.load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to read settings, starting with defaults: {e}");
            Settings::default()
        }
    };
    info!(
        "Settings loaded for target process '{}'",
        settings.target.process_name
    );

    let table = SystemProcessTable;
    let prompter = DialogPrompter;

    let (executable, data_dir) = {
        let mut resolver = PathResolver::new(&store, &mut settings, &table, &prompter);

        let executable = match resolver.resolve_executable() {
            Ok(resolved) => resolved.path,
            Err(WalletSwitchError::UserAborted) => {
                info!("Executable selection cancelled, exiting");
                return Ok(());
            }
            Err(e) => {
                error!("Executable resolution failed: {e}");
                show_error_and_exit(&get_user_friendly_error(&e));
                return Err(e.into());
            }
        };

        let data_dir = match resolver.resolve_data_directory() {
            Ok(resolved) => resolved.path,
            Err(WalletSwitchError::UserAborted) => {
                info!("Data directory selection cancelled, exiting");
                return Ok(());
            }
            Err(e) => {
                error!("Data directory resolution failed: {e}");
                show_error_and_exit(&get_user_friendly_error(&e));
                return Err(e.into());
            }
        };

        (executable, data_dir)
    };

    info!("Wallet executable: {}", executable.display());
    info!("Wallet data directory: {}", data_dir.display());

    let wallets = match catalog::list_wallets(&data_dir) {
        Ok(wallets) => wallets,
        Err(e) => {
            error!("Failed to scan {} for wallets: {e}", data_dir.display());
            show_error_and_exit(&get_user_friendly_error(&e));
            return Err(e.into());
        }
    };
    if wallets.is_empty() {
        warn!(
            "No wallet files found in {}; the tray menu will offer a rescan",
            data_dir.display()
        );
    } else {
        info!("Found {} wallet file(s)", wallets.len());
    }

    let supervisor = WalletSupervisor::new(
        Box::new(SystemProcessTable),
        settings.target.process_name.clone(),
    );

    tray::run(tray::TrayContext {
        executable,
        data_dir,
        wallets,
        supervisor: Arc::new(Mutex::new(supervisor)),
    })
    .context("Tray event loop terminated with error")?;

    info!("WalletSwitch shutting down");

    Ok(())
}

/// Non-Windows fallback: nothing to run
#[cfg(not(windows))]
fn run() -> Result<()> {
    eprintln!("WalletSwitch is a Windows-only application.");
    eprintln!("The tray menu, dialogs and process control require the Windows shell.");
    Err(anyhow::anyhow!("WalletSwitch is a Windows-only application"))
}

/// Shows an error dialog and exits the application.
#[cfg(windows)]
fn show_error_and_exit(message: &str) {
    use rfd::MessageDialog;

    MessageDialog::new()
        .set_title("WalletSwitch - Error")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .set_level(rfd::MessageLevel::Error)
        .show();

    std::process::exit(1);
}

/// Shows an error message and exits the application (non-Windows fallback).
#[cfg(not(windows))]
fn show_error_and_exit(message: &str) {
    eprintln!("ERROR: {message}");
    std::process::exit(1);
}
