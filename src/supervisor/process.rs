//! Process table access and process handles
//!
//! Defines the seam between the supervisor and the operating system:
//! [`ProcessTable`] finds and starts wallet processes, [`ManagedProcess`]
//! is one running instance that can be terminated and watched for exit.
//! The production implementation uses the Windows Toolhelp32 snapshot API
//! for enumeration and kernel process handles for everything else.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc;
use std::time::Duration;

#[cfg(windows)]
use std::thread;

#[cfg(windows)]
use tracing::{debug, warn};

#[cfg(windows)]
use windows::Win32::Foundation::{
    CloseHandle, DUPLICATE_SAME_ACCESS, DuplicateHandle, ERROR_NO_MORE_FILES, HANDLE,
    WAIT_OBJECT_0, WAIT_TIMEOUT,
};

#[cfg(windows)]
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};

#[cfg(windows)]
use windows::Win32::System::Threading::{
    GetCurrentProcess, OpenProcess, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
    PROCESS_SYNCHRONIZE, PROCESS_TERMINATE, QueryFullProcessImageNameW, TerminateProcess,
    WaitForSingleObject,
};

#[cfg(windows)]
use windows::core::PWSTR;

use crate::error::{Result, WalletSwitchError};

/// Handle to one running wallet process
///
/// Implementations are returned by [`ProcessTable::find_running`] and are
/// consumed by the supervisor during a switch.
pub trait ManagedProcess: Send {
    /// OS process identifier, for logging
    fn pid(&self) -> u32;

    /// Full path of the process image, when the OS will share it
    fn executable_path(&self) -> Option<PathBuf>;

    /// Ask the OS to terminate the process forcefully
    fn terminate(&self) -> Result<()>;

    /// Channel that receives one message when the process exits
    ///
    /// Subscribing takes effect immediately: an exit that happens after
    /// this call returns is never missed, even one racing the
    /// termination request. The subscription stays armed for at least
    /// `wait`, then may lapse. A lapsed subscription, like one that
    /// could not be armed, drops the sender and the receiver reports a
    /// disconnected channel.
    fn exit_notification(&self, wait: Duration) -> mpsc::Receiver<()>;
}

/// Access to the operating system's process table
pub trait ProcessTable: Send + Sync {
    /// Find a running instance of the named executable
    ///
    /// `process_name` carries no path and no extension; matching is
    /// case-insensitive. When several instances are running, the first
    /// one that can be opened is returned.
    fn find_running(&self, process_name: &str) -> Result<Option<Box<dyn ManagedProcess>>>;

    /// Start a detached process with a single argument, returning its PID
    fn launch(&self, executable: &Path, argument: &str) -> Result<u32>;
}

/// Process table backed by the Windows Toolhelp32 snapshot API
///
/// On non-Windows platforms `find_running` reports an error; `launch`
/// works anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessTable;

impl ProcessTable for SystemProcessTable {
    fn find_running(&self, process_name: &str) -> Result<Option<Box<dyn ManagedProcess>>> {
        #[cfg(windows)]
        {
            let target = normalize_process_name(process_name);
            for pid in pids_by_name(&target)? {
                match open_process(pid) {
                    Ok(process) => return Ok(Some(Box::new(process))),
                    Err(e) => {
                        warn!("Found {process_name} as PID {pid} but could not open it: {e}");
                    }
                }
            }
            Ok(None)
        }

        #[cfg(not(windows))]
        {
            let _ = process_name;
            Err(WalletSwitchError::ProcessTableError(
                crate::error::StringError::new("Process inspection is only supported on Windows"),
            ))
        }
    }

    #[expect(
        clippy::zombie_processes,
        reason = "the wallet application outlives this utility and is never reaped"
    )]
    fn launch(&self, executable: &Path, argument: &str) -> Result<u32> {
        let child = Command::new(executable)
            .arg(argument)
            .spawn()
            .map_err(WalletSwitchError::LaunchFailed)?;
        let pid = child.id();
        drop(child);
        Ok(pid)
    }
}

/// Owned process handle, closed on drop
#[cfg(windows)]
#[derive(Debug)]
struct ProcessHandle(HANDLE);

// A process handle refers to a kernel object, not to the thread that
// opened it; Win32 permits waiting on and closing it from any thread.
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "kernel object handles are valid from any thread"
)]
unsafe impl Send for ProcessHandle {}

#[cfg(windows)]
impl ProcessHandle {
    /// Duplicate the handle so another thread can wait on it independently
    ///
    /// # Safety
    ///
    /// Source and target process are both the current process; the source
    /// handle is owned by `self` and valid for the duration of the call.
    /// The out parameter is a stack variable of the correct type.
    #[expect(unsafe_code, reason = "Windows FFI for DuplicateHandle")]
    fn duplicate(&self) -> Result<Self> {
        let mut duplicated = HANDLE::default();
        unsafe {
            DuplicateHandle(
                GetCurrentProcess(),
                self.0,
                GetCurrentProcess(),
                &raw mut duplicated,
                0,
                false,
                DUPLICATE_SAME_ACCESS,
            )?;
        }
        Ok(Self(duplicated))
    }
}

#[cfg(windows)]
impl Drop for ProcessHandle {
    /// Closes the process handle
    ///
    /// # Safety
    ///
    /// The guard owns the handle (closed once, never cloned without
    /// `DuplicateHandle`). `CloseHandle` is safe on valid handles; the
    /// result is ignored (no destructor recovery).
    #[expect(unsafe_code, reason = "Windows FFI for CloseHandle")]
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// A running process opened from the Windows process table
#[cfg(windows)]
#[derive(Debug)]
pub struct WindowsProcess {
    pid: u32,
    executable_path: Option<PathBuf>,
    handle: ProcessHandle,
}

#[cfg(windows)]
impl ManagedProcess for WindowsProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn executable_path(&self) -> Option<PathBuf> {
        self.executable_path.clone()
    }

    /// Forcefully terminate the process
    ///
    /// # Safety
    ///
    /// The handle was opened with `PROCESS_TERMINATE` access and stays
    /// valid while `self` is alive.
    #[expect(unsafe_code, reason = "Windows FFI for TerminateProcess")]
    fn terminate(&self) -> Result<()> {
        unsafe {
            TerminateProcess(self.handle.0, 1)?;
        }
        Ok(())
    }

    /// Arm a waiter thread that blocks on the process handle
    ///
    /// The thread parks for at most `wait` plus a small margin, so a
    /// subscriber that gives up never strands a thread (and its
    /// duplicated handle) on a process that keeps running.
    ///
    /// # Safety
    ///
    /// The waiter thread owns a duplicated handle opened with
    /// `PROCESS_SYNCHRONIZE` access, so the wait stays valid even after
    /// `self` is dropped.
    #[expect(unsafe_code, reason = "Windows FFI for WaitForSingleObject")]
    fn exit_notification(&self, wait: Duration) -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel();
        match self.handle.duplicate() {
            Ok(waiter) => {
                let pid = self.pid;
                let timeout = waiter_timeout_millis(wait);
                thread::spawn(move || {
                    let event = unsafe { WaitForSingleObject(waiter.0, timeout) };
                    if event == WAIT_OBJECT_0 {
                        debug!("PID {pid} handle became signalled");
                        let _ = tx.send(());
                    } else if event == WAIT_TIMEOUT {
                        // The subscriber's own deadline has already passed;
                        // dropping the sender retires the subscription
                        debug!("PID {pid} still running after {timeout} ms, waiter retiring");
                    } else {
                        // Dropping the sender reports the lost wait as a
                        // disconnected channel
                        warn!("Wait on PID {pid} ended without an exit signal: {event:?}");
                    }
                });
            }
            Err(e) => {
                warn!("Failed to duplicate handle for PID {}: {e}", self.pid);
            }
        }
        rx
    }
}

/// Enumerate PIDs whose executable name matches the target
///
/// `target` must already be normalized (lowercase, no extension).
///
/// # Safety
///
/// `CreateToolhelp32Snapshot` called with valid flags (`TH32CS_SNAPPROCESS`,
/// PID 0); errors propagated. Handle wrapped in `SnapshotGuard` (RAII) for
/// cleanup. `PROCESSENTRY32W` initialized with correct `dwSize`.
/// `Process32FirstW`/`NextW` return codes checked before data access;
/// `ERROR_NO_MORE_FILES` handled as iteration end. `&raw mut entry` valid
/// (stack variable, correct size).
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Windows FFI for Toolhelp32 process enumeration"
)]
fn pids_by_name(target: &str) -> Result<Vec<u32>> {
    let snapshot = unsafe {
        CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0).map_err(|e| {
            tracing::error!("Windows API error - CreateToolhelp32Snapshot failed: {e}");
            WalletSwitchError::ProcessTableError(Box::new(e))
        })?
    };

    // Ensure the snapshot handle is closed when we're done
    let _guard = SnapshotGuard(snapshot);

    #[expect(
        clippy::cast_possible_truncation,
        reason = "size_of::<PROCESSENTRY32W>() is a small constant that fits in u32"
    )]
    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut pids = Vec::new();
    let mut has_process = unsafe { Process32FirstW(snapshot, &raw mut entry).is_ok() };

    while has_process {
        // szExeFile is a null-terminated wide string
        if let Some(name) = extract_process_name(&entry.szExeFile)
            && normalize_process_name(&name) == target
        {
            pids.push(entry.th32ProcessID);
        }

        has_process = unsafe {
            match Process32NextW(snapshot, &raw mut entry) {
                Ok(()) => true,
                Err(e) => {
                    // ERROR_NO_MORE_FILES is expected at the end
                    if e.code() != ERROR_NO_MORE_FILES.to_hresult() {
                        warn!("Error iterating processes: {e}");
                    }
                    false
                }
            }
        };
    }

    debug!("Found {} process(es) named {target}", pids.len());
    Ok(pids)
}

/// Open a process with the rights a switch needs: terminate, query the
/// image path, wait for exit
///
/// # Safety
///
/// `OpenProcess` called with a PID from a fresh snapshot; a stale PID
/// yields an error, never an invalid handle. The handle is wrapped in
/// `ProcessHandle` (RAII) immediately.
#[cfg(windows)]
#[expect(unsafe_code, reason = "Windows FFI for OpenProcess")]
fn open_process(pid: u32) -> Result<WindowsProcess> {
    let handle = unsafe {
        OpenProcess(
            PROCESS_TERMINATE | PROCESS_QUERY_LIMITED_INFORMATION | PROCESS_SYNCHRONIZE,
            false,
            pid,
        )?
    };
    let handle = ProcessHandle(handle);
    let executable_path = query_image_path(&handle);
    Ok(WindowsProcess {
        pid,
        executable_path,
        handle,
    })
}

/// Full image path of an open process, if the OS will share it
///
/// # Safety
///
/// The handle was opened with `PROCESS_QUERY_LIMITED_INFORMATION` access.
/// The buffer pointer and its length travel together; the API rewrites
/// the length to the number of characters written.
#[cfg(windows)]
#[expect(unsafe_code, reason = "Windows FFI for QueryFullProcessImageNameW")]
fn query_image_path(handle: &ProcessHandle) -> Option<PathBuf> {
    let mut buffer = [0u16; 1024];
    #[expect(
        clippy::cast_possible_truncation,
        reason = "buffer length is a compile-time constant that fits in u32"
    )]
    let mut len = buffer.len() as u32;

    let result = unsafe {
        QueryFullProcessImageNameW(
            handle.0,
            PROCESS_NAME_WIN32,
            PWSTR(buffer.as_mut_ptr()),
            &raw mut len,
        )
    };

    match result {
        Ok(()) => Some(PathBuf::from(String::from_utf16_lossy(
            &buffer[..len as usize],
        ))),
        Err(e) => {
            debug!("Could not query image path: {e}");
            None
        }
    }
}

/// RAII guard for a Windows snapshot handle
#[cfg(windows)]
struct SnapshotGuard(HANDLE);

#[cfg(windows)]
impl Drop for SnapshotGuard {
    /// Closes the snapshot handle
    ///
    /// # Safety
    ///
    /// Handle from `CreateToolhelp32Snapshot` (valid or error; only valid
    /// stored). Guard owns the handle (closed once, not cloned/shared).
    /// `CloseHandle` safe on valid snapshot handles; result ignored.
    #[expect(
        unsafe_code,
        reason = "Windows FFI for CloseHandle to release snapshot handle"
    )]
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// Extract a process name from the szExeFile field
///
/// Converts a null-terminated wide string to a Rust String.
#[cfg(windows)]
fn extract_process_name(sz_exe_file: &[u16; 260]) -> Option<String> {
    let len = sz_exe_file
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(sz_exe_file.len());

    String::from_utf16(&sz_exe_file[..len]).ok()
}

/// Normalize an executable name for comparison: lowercase, `.exe` dropped
///
/// Examples:
/// - "dogecoin-qt.exe" -> "dogecoin-qt"
/// - "Dogecoin-Qt.EXE" -> "dogecoin-qt"
/// - "dogecoin-qt" -> "dogecoin-qt"
#[cfg_attr(not(windows), allow(dead_code))]
fn normalize_process_name(name: &str) -> String {
    let lower = name.to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

/// Extra armed time beyond the requested wait, so the subscriber's own
/// timeout always fires before the waiter gives up
const WAITER_MARGIN: Duration = Duration::from_secs(5);

/// Milliseconds a waiter thread stays parked on a process handle
#[cfg_attr(not(windows), allow(dead_code))]
fn waiter_timeout_millis(wait: Duration) -> u32 {
    let armed = wait.saturating_add(WAITER_MARGIN);
    // INFINITE is u32::MAX; saturate just below it so the wait stays bounded
    u32::try_from(armed.as_millis()).unwrap_or(u32::MAX - 1)
}
