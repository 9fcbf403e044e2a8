//! Wallet switching: terminate the running wallet, confirm its exit,
//! relaunch with the chosen wallet
//!
//! The sequence is strict. The exit subscription is armed before the
//! termination request so a fast exit cannot slip past unobserved, and
//! the replacement process starts only after the notification for that
//! specific process arrives. When no instance is running, a switch is
//! just a launch.

use std::path::Path;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::WalletId;
use crate::error::{Result, WalletSwitchError};
use crate::supervisor::process::ProcessTable;

/// How long a switch waits for the old process to confirm its exit
pub const DEFAULT_EXIT_WAIT: Duration = Duration::from_secs(30);

/// Supervisor that replaces the running wallet process
///
/// [`switch`](Self::switch) blocks for up to the configured exit wait;
/// callers run it off the UI thread and serialize concurrent switches
/// externally.
pub struct WalletSupervisor {
    table: Box<dyn ProcessTable>,
    process_name: String,
    exit_wait: Duration,
}

impl WalletSupervisor {
    /// Create a supervisor for the named wallet process
    pub fn new(table: Box<dyn ProcessTable>, process_name: impl Into<String>) -> Self {
        Self::with_exit_wait(table, process_name, DEFAULT_EXIT_WAIT)
    }

    /// Create a supervisor with a custom exit wait
    pub fn with_exit_wait(
        table: Box<dyn ProcessTable>,
        process_name: impl Into<String>,
        exit_wait: Duration,
    ) -> Self {
        Self {
            table,
            process_name: process_name.into(),
            exit_wait,
        }
    }

    /// Switch the wallet application to the given wallet
    ///
    /// Terminates the running instance if there is one, waits for its
    /// exit to be confirmed, then starts a new instance with
    /// `-wallet=<identifier>`.
    ///
    /// # Errors
    ///
    /// [`WalletSwitchError::ExitNotConfirmed`] when the old process does
    /// not confirm its exit within the wait; no new process is started
    /// in that case. [`WalletSwitchError::LaunchFailed`] when the old
    /// instance is gone but the new one cannot be spawned.
    pub fn switch(&self, executable: &Path, wallet: &WalletId) -> Result<()> {
        info!("Switching to wallet '{wallet}'");

        if let Some(process) = self.table.find_running(&self.process_name)? {
            let pid = process.pid();
            info!("Found running instance with PID {pid}, requesting termination");

            // Arm the exit subscription before asking the process to die,
            // otherwise a fast exit could be missed
            let exited = process.exit_notification(self.exit_wait);

            if let Err(e) = process.terminate() {
                // The wait below settles whether the process is still alive
                warn!("Termination request for PID {pid} failed: {e}");
            }

            match exited.recv_timeout(self.exit_wait) {
                Ok(()) => info!("PID {pid} confirmed exit"),
                Err(RecvTimeoutError::Timeout) => {
                    warn!("PID {pid} did not exit within {:?}", self.exit_wait);
                    return Err(WalletSwitchError::ExitNotConfirmed {
                        timeout: self.exit_wait,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Exit notification for PID {pid} was lost");
                    return Err(WalletSwitchError::ExitNotConfirmed {
                        timeout: self.exit_wait,
                    });
                }
            }
        } else {
            info!("No running instance of {}", self.process_name);
        }

        let pid = self.table.launch(executable, &wallet.launch_arg())?;
        info!(
            "Started {} with wallet '{wallet}' as PID {pid}",
            self.process_name
        );
        Ok(())
    }
}
