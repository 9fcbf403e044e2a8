//! `WalletSwitch` - Dogecoin Core wallet switcher for Windows
//!
//! Lets a tray menu swap which wallet file Dogecoin Core loads.
//! Scans the wallet data directory for wallet `.dat` files, and on
//! selection closes the running wallet process, waits for it to
//! confirm its exit, then relaunches the executable with a `-wallet=`
//! argument naming the chosen file.
//!
//! The pieces: [`resolver`] finds the wallet executable and data
//! directory, [`catalog`] enumerates switchable wallet files, and
//! [`supervisor`] owns the stop-wait-relaunch sequence.
//!
//! # Requirements
//!
//! - Windows 10 or later
//! - Dogecoin Core (or a compatible Qt wallet) installed

// Module declarations
pub mod catalog;
pub mod config;
pub mod error;
pub mod resolver;
pub mod supervisor;
pub mod utils;

// Re-export commonly used types
pub use error::{Result, WalletSwitchError};
