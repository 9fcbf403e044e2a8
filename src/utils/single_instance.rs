//! Single instance enforcement
//!
//! Ensures only one instance of the application runs at a time using a
//! Windows named mutex.

use crate::error::Result;

#[cfg(windows)]
use crate::error::WalletSwitchError;

#[cfg(windows)]
use windows::Win32::Foundation::{CloseHandle, HANDLE};
#[cfg(windows)]
use windows::Win32::System::Threading::{CreateMutexW, OpenMutexW, SYNCHRONIZATION_SYNCHRONIZE};

/// Single instance guard using a Windows named mutex (released on drop)
#[cfg(windows)]
pub struct SingleInstanceGuard {
    mutex_handle: HANDLE,
}

#[cfg(windows)]
impl SingleInstanceGuard {
    /// Create a new single instance guard
    ///
    /// # Errors
    ///
    /// Returns [`WalletSwitchError::AlreadyRunning`] when the named
    /// mutex already exists, meaning another instance owns it.
    #[expect(unsafe_code, reason = "Windows named-mutex FFI")]
    pub fn new() -> Result<Self> {
        use tracing::{debug, error};
        use windows::core::HSTRING;

        let mutex_name = HSTRING::from("Global\\WalletSwitch_SingleInstance_Mutex");

        unsafe {
            // An openable mutex means another instance is holding it.
            if let Ok(existing_handle) = OpenMutexW(SYNCHRONIZATION_SYNCHRONIZE, false, &mutex_name)
            {
                error!("Another instance of WalletSwitch is already running");
                let _ = CloseHandle(existing_handle);
                Err(WalletSwitchError::AlreadyRunning)
            } else {
                let mutex_handle = CreateMutexW(None, true, &mutex_name)?;
                debug!("Single instance mutex created");
                Ok(Self { mutex_handle })
            }
        }
    }
}

#[cfg(windows)]
impl Drop for SingleInstanceGuard {
    #[expect(unsafe_code, reason = "Windows named-mutex FFI")]
    fn drop(&mut self) {
        use tracing::debug;

        unsafe {
            let _ = CloseHandle(self.mutex_handle);
            debug!("Single instance mutex released");
        }
    }
}

/// Stub implementation for non-Windows platforms
#[cfg(not(windows))]
pub struct SingleInstanceGuard;

#[cfg(not(windows))]
impl SingleInstanceGuard {
    /// Create a new single instance guard (stub for non-Windows, always succeeds)
    ///
    /// # Errors
    ///
    /// Never fails on non-Windows platforms.
    pub fn new() -> Result<Self> {
        Ok(Self)
    }
}
