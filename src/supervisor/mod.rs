//! Process supervision module
//!
//! This module owns the lifecycle of the wallet application's process:
//! finding a running instance, terminating it, confirming the exit, and
//! starting a replacement that loads the chosen wallet.
//!
//! # Switch sequence
//!
//! 1. Query the process table for a running instance of the wallet
//!    executable.
//! 2. If one is found, arm its exit notification, then request forceful
//!    termination.
//! 3. Block until the exit notification arrives (bounded wait). A switch
//!    that cannot confirm the exit stops here; two live instances are
//!    never possible.
//! 4. Start a new process with `-wallet=<identifier>` and let it run
//!    detached.
//!
//! # Architecture
//!
//! - [`ProcessTable`]: seam to the OS process table (enumerate, open,
//!   spawn). The production implementation is [`SystemProcessTable`];
//!   tests script their own.
//! - [`ManagedProcess`]: one opened process (terminate, watch for exit).
//! - [`WalletSupervisor`]: the blocking switch algorithm itself.

pub mod process;
pub mod switcher;

pub use process::{ManagedProcess, ProcessTable, SystemProcessTable};
pub use switcher::{DEFAULT_EXIT_WAIT, WalletSupervisor};
