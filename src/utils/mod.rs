//! Utility modules
//!
//! Provides auto-start management, logging, application paths, and
//! single instance enforcement.

pub mod autostart;
pub mod logging;
pub mod paths;
pub mod single_instance;

pub use autostart::AutoStartManager;
pub use logging::init_logging;
pub use single_instance::SingleInstanceGuard;
