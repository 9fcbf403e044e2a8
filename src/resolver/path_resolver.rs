//! Fallback-chain resolution of the executable and data directory paths
//!
//! Both resolutions walk a fixed chain of candidates and stop at the
//! first one that exists on disk:
//!
//! - Executable: saved setting, module path of a running wallet
//!   instance, conventional install location, interactive prompt.
//! - Data directory: saved setting, conventional per-user location,
//!   interactive prompt (validated against the block index file).
//!
//! Saved settings are always revalidated before use, and every
//! resolution that did not come from a saved setting is written back to
//! the settings store so later runs skip straight to step one. Failing
//! to persist is logged and otherwise ignored.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::prompt::Prompter;
use crate::catalog;
use crate::config::{Settings, SettingsStore, TargetApp};
use crate::error::{Result, WalletSwitchError};
use crate::supervisor::ProcessTable;

/// Retry prompt shown after the executable dialog is dismissed or the
/// chosen file does not exist
const RETRY_EXECUTABLE_MESSAGE: &str = "The wallet executable was not selected.\n\n\
     Search for it again? Choosing Cancel closes WalletSwitch.";

/// Retry prompt shown after the folder dialog is dismissed or the
/// chosen folder holds no block index file
const RETRY_DATA_DIR_MESSAGE: &str = "That folder does not look like a wallet data directory \
     (no blkindex.dat found).\n\n\
     Choose a different folder? Choosing Cancel closes WalletSwitch.";

/// Which resource a resolution produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedKind {
    /// The wallet executable
    Executable,
    /// The wallet data directory
    DataDirectory,
}

/// Which step of the fallback chain produced a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Revalidated path from the settings file
    SavedSetting,
    /// Module path adopted from a running wallet instance
    RunningProcess,
    /// Conventional install or data location
    DefaultLocation,
    /// Path picked interactively by the user
    UserPrompt,
}

/// A successfully resolved path together with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Which resource was resolved
    pub kind: ResolvedKind,
    /// The path that exists on disk
    pub path: PathBuf,
    /// Which chain step produced it
    pub source: ResolutionSource,
}

/// Conventional locations tried before prompting the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverDefaults {
    /// Expected install path of the wallet executable
    pub executable: PathBuf,
    /// Expected per-user data directory
    pub data_dir: PathBuf,
}

impl ResolverDefaults {
    /// Derives the conventional locations for a target application
    #[must_use]
    pub fn for_target(target: &TargetApp) -> Self {
        Self {
            executable: target.default_executable_path(),
            data_dir: target.default_data_dir(),
        }
    }
}

/// Resolves the two paths the switcher needs before it can run
pub struct PathResolver<'a> {
    store: &'a SettingsStore,
    settings: &'a mut Settings,
    table: &'a dyn ProcessTable,
    prompter: &'a dyn Prompter,
    defaults: ResolverDefaults,
}

impl<'a> PathResolver<'a> {
    /// Creates a resolver with conventional defaults derived from the
    /// configured target application
    pub fn new(
        store: &'a SettingsStore,
        settings: &'a mut Settings,
        table: &'a dyn ProcessTable,
        prompter: &'a dyn Prompter,
    ) -> Self {
        let defaults = ResolverDefaults::for_target(&settings.target);
        Self::with_defaults(store, settings, table, prompter, defaults)
    }

    /// Creates a resolver with explicit default locations
    pub fn with_defaults(
        store: &'a SettingsStore,
        settings: &'a mut Settings,
        table: &'a dyn ProcessTable,
        prompter: &'a dyn Prompter,
        defaults: ResolverDefaults,
    ) -> Self {
        Self {
            store,
            settings,
            table,
            prompter,
            defaults,
        }
    }

    /// Resolves the wallet executable path
    ///
    /// Walks saved setting, running instance, default install location
    /// and finally an interactive prompt with retry. Any result not
    /// taken from the saved setting is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`WalletSwitchError::UserAborted`] when the user
    /// declines to retry after a failed prompt round.
    pub fn resolve_executable(&mut self) -> Result<ResolvedPath> {
        // Step 1: saved setting, revalidated against the file system.
        if let Some(saved) = &self.settings.wallet_exec {
            if saved.is_file() {
                debug!("Using saved executable path: {}", saved.display());
                return Ok(ResolvedPath {
                    kind: ResolvedKind::Executable,
                    path: saved.clone(),
                    source: ResolutionSource::SavedSetting,
                });
            }
            warn!(
                "Saved executable path no longer exists: {}",
                saved.display()
            );
        }

        // Step 2: adopt the module path of an already running instance.
        match self.table.find_running(&self.settings.target.process_name) {
            Ok(Some(process)) => {
                if let Some(path) = process.executable_path()
                    && path.is_file()
                {
                    info!(
                        "Adopted executable path from running instance (PID {}): {}",
                        process.pid(),
                        path.display()
                    );
                    return Ok(self.accept_executable(path, ResolutionSource::RunningProcess));
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Process lookup failed, skipping running-instance step: {e}"),
        }

        // Step 3: conventional install location.
        if self.defaults.executable.is_file() {
            info!(
                "Using default install location: {}",
                self.defaults.executable.display()
            );
            let path = self.defaults.executable.clone();
            return Ok(self.accept_executable(path, ResolutionSource::DefaultLocation));
        }

        // Step 4: ask the user, offering a retry after every failed round.
        let file_name = self.settings.target.executable_file_name();
        loop {
            if let Some(picked) = self.prompter.pick_executable(&file_name) {
                if picked.is_file() {
                    info!("User selected executable: {}", picked.display());
                    return Ok(self.accept_executable(picked, ResolutionSource::UserPrompt));
                }
                warn!("Selected executable does not exist: {}", picked.display());
            }
            if !self.prompter.ask_retry(RETRY_EXECUTABLE_MESSAGE) {
                info!("User declined to search for the executable again");
                return Err(WalletSwitchError::UserAborted);
            }
        }
    }

    /// Resolves the wallet data directory
    ///
    /// Walks saved setting, conventional per-user location and finally
    /// an interactive prompt with retry. A prompted folder only counts
    /// when it contains the block index file; the conventional location
    /// only has to exist. Any result not taken from the saved setting
    /// is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`WalletSwitchError::UserAborted`] when the user
    /// declines to retry after a failed prompt round.
    pub fn resolve_data_directory(&mut self) -> Result<ResolvedPath> {
        // Step 1: saved setting, revalidated against the file system.
        if let Some(saved) = &self.settings.data_dir {
            if saved.is_dir() {
                debug!("Using saved data directory: {}", saved.display());
                return Ok(ResolvedPath {
                    kind: ResolvedKind::DataDirectory,
                    path: saved.clone(),
                    source: ResolutionSource::SavedSetting,
                });
            }
            warn!("Saved data directory no longer exists: {}", saved.display());
        }

        // Step 2: conventional per-user location.
        if self.defaults.data_dir.is_dir() {
            info!(
                "Using default data directory: {}",
                self.defaults.data_dir.display()
            );
            let path = self.defaults.data_dir.clone();
            return Ok(self.accept_data_dir(path, ResolutionSource::DefaultLocation));
        }

        // Step 3: ask the user. A folder picked here must plausibly hold
        // wallet data, which the block index file stands in for.
        loop {
            if let Some(picked) = self.prompter.pick_data_directory() {
                if picked.join(catalog::BLOCK_INDEX_FILE).is_file() {
                    info!("User selected data directory: {}", picked.display());
                    return Ok(self.accept_data_dir(picked, ResolutionSource::UserPrompt));
                }
                warn!(
                    "Selected folder contains no {}: {}",
                    catalog::BLOCK_INDEX_FILE,
                    picked.display()
                );
            }
            if !self.prompter.ask_retry(RETRY_DATA_DIR_MESSAGE) {
                info!("User declined to choose a data directory again");
                return Err(WalletSwitchError::UserAborted);
            }
        }
    }

    fn accept_executable(&mut self, path: PathBuf, source: ResolutionSource) -> ResolvedPath {
        self.settings.wallet_exec = Some(path.clone());
        self.persist();
        ResolvedPath {
            kind: ResolvedKind::Executable,
            path,
            source,
        }
    }

    fn accept_data_dir(&mut self, path: PathBuf, source: ResolutionSource) -> ResolvedPath {
        self.settings.data_dir = Some(path.clone());
        self.persist();
        ResolvedPath {
            kind: ResolvedKind::DataDirectory,
            path,
            source,
        }
    }

    // Persistence failures must not block a successful resolution; the
    // in-memory value still carries the session.
    fn persist(&self) {
        if let Err(e) = self.store.save(self.settings) {
            warn!("Failed to persist resolved path, continuing with in-memory value: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::VecDeque;
    use std::fs;
    use std::path::Path;
    use std::sync::mpsc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tempfile::TempDir;

    use super::*;
    use crate::supervisor::ManagedProcess;

    /// Prompter that replays scripted answers and counts dialog rounds
    #[derive(Default)]
    struct ScriptedPrompter {
        executables: Mutex<VecDeque<Option<PathBuf>>>,
        folders: Mutex<VecDeque<Option<PathBuf>>>,
        retries: Mutex<VecDeque<bool>>,
        prompts: Mutex<usize>,
    }

    impl ScriptedPrompter {
        fn with_executables(picks: Vec<Option<PathBuf>>, retries: Vec<bool>) -> Self {
            Self {
                executables: Mutex::new(picks.into()),
                retries: Mutex::new(retries.into()),
                ..Self::default()
            }
        }

        fn with_folders(picks: Vec<Option<PathBuf>>, retries: Vec<bool>) -> Self {
            Self {
                folders: Mutex::new(picks.into()),
                retries: Mutex::new(retries.into()),
                ..Self::default()
            }
        }

        fn prompt_count(&self) -> usize {
            *self.prompts.lock()
        }
    }

    impl Prompter for ScriptedPrompter {
        fn pick_executable(&self, _executable_file_name: &str) -> Option<PathBuf> {
            *self.prompts.lock() += 1;
            self.executables.lock().pop_front().unwrap_or(None)
        }

        fn pick_data_directory(&self) -> Option<PathBuf> {
            *self.prompts.lock() += 1;
            self.folders.lock().pop_front().unwrap_or(None)
        }

        // Unscripted answer defaults to "give up" so a buggy chain
        // terminates instead of looping.
        fn ask_retry(&self, _message: &str) -> bool {
            self.retries.lock().pop_front().unwrap_or(false)
        }
    }

    /// Process table with no matching process
    struct NoProcessTable;

    impl ProcessTable for NoProcessTable {
        fn find_running(&self, _process_name: &str) -> Result<Option<Box<dyn ManagedProcess>>> {
            Ok(None)
        }

        fn launch(&self, _executable: &Path, _argument: &str) -> Result<u32> {
            Ok(0)
        }
    }

    /// Process table reporting one running instance at a fixed path
    struct OneProcessTable {
        executable: PathBuf,
    }

    impl ProcessTable for OneProcessTable {
        fn find_running(&self, _process_name: &str) -> Result<Option<Box<dyn ManagedProcess>>> {
            Ok(Some(Box::new(StaticProcess {
                path: self.executable.clone(),
            })))
        }

        fn launch(&self, _executable: &Path, _argument: &str) -> Result<u32> {
            Ok(0)
        }
    }

    /// Process table whose lookup always fails
    struct FailingTable;

    impl ProcessTable for FailingTable {
        fn find_running(&self, _process_name: &str) -> Result<Option<Box<dyn ManagedProcess>>> {
            Err(WalletSwitchError::ProcessTableError(
                crate::error::StringError::new("simulated lookup failure"),
            ))
        }

        fn launch(&self, _executable: &Path, _argument: &str) -> Result<u32> {
            Ok(0)
        }
    }

    struct StaticProcess {
        path: PathBuf,
    }

    impl ManagedProcess for StaticProcess {
        fn pid(&self) -> u32 {
            7777
        }

        fn executable_path(&self) -> Option<PathBuf> {
            Some(self.path.clone())
        }

        fn terminate(&self) -> Result<()> {
            Ok(())
        }

        fn exit_notification(&self, _wait: Duration) -> mpsc::Receiver<()> {
            let (_tx, rx) = mpsc::channel();
            rx
        }
    }

    struct TestEnv {
        _dir: TempDir,
        root: PathBuf,
        store: SettingsStore,
        settings: Settings,
        defaults: ResolverDefaults,
    }

    fn test_env() -> TestEnv {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let store = SettingsStore::new(root.join("settings.json"));
        let defaults = ResolverDefaults {
            executable: root.join("install").join("dogecoin-qt.exe"),
            data_dir: root.join("appdata").join("DogeCoin"),
        };
        TestEnv {
            _dir: dir,
            root,
            store,
            settings: Settings::default(),
            defaults,
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn saved_executable_short_circuits_without_prompting() {
        let mut env = test_env();
        let saved = env.root.join("saved").join("dogecoin-qt.exe");
        touch(&saved);
        env.settings.wallet_exec = Some(saved.clone());

        let prompter = ScriptedPrompter::default();
        let table = NoProcessTable;
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_executable().unwrap();
        assert_eq!(resolved.source, ResolutionSource::SavedSetting);
        assert_eq!(resolved.path, saved);
        assert_eq!(prompter.prompt_count(), 0);
        // Nothing new to persist.
        assert!(!env.store.path().exists());
    }

    #[test]
    fn stale_saved_executable_falls_through_to_prompt() {
        let mut env = test_env();
        env.settings.wallet_exec = Some(env.root.join("gone").join("dogecoin-qt.exe"));
        let picked = env.root.join("picked").join("dogecoin-qt.exe");
        touch(&picked);

        let prompter = ScriptedPrompter::with_executables(vec![Some(picked.clone())], vec![]);
        let table = NoProcessTable;
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_executable().unwrap();
        assert_eq!(resolved.source, ResolutionSource::UserPrompt);
        assert_eq!(resolved.path, picked);
        assert_eq!(env.settings.wallet_exec, Some(picked.clone()));
        assert_eq!(env.store.load().unwrap().wallet_exec, Some(picked));
    }

    #[test]
    fn running_instance_path_is_adopted_and_persisted() {
        let mut env = test_env();
        let running = env.root.join("elsewhere").join("dogecoin-qt.exe");
        touch(&running);

        let prompter = ScriptedPrompter::default();
        let table = OneProcessTable {
            executable: running.clone(),
        };
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_executable().unwrap();
        assert_eq!(resolved.source, ResolutionSource::RunningProcess);
        assert_eq!(resolved.path, running);
        assert_eq!(env.store.load().unwrap().wallet_exec, Some(running));
        assert_eq!(prompter.prompt_count(), 0);
    }

    #[test]
    fn default_install_location_is_used_when_present() {
        let mut env = test_env();
        touch(&env.defaults.executable);

        let prompter = ScriptedPrompter::default();
        let table = NoProcessTable;
        let expected = env.defaults.executable.clone();
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_executable().unwrap();
        assert_eq!(resolved.source, ResolutionSource::DefaultLocation);
        assert_eq!(resolved.path, expected);
        assert_eq!(env.store.load().unwrap().wallet_exec, Some(expected));
    }

    #[test]
    fn process_lookup_failure_skips_to_default_location() {
        let mut env = test_env();
        touch(&env.defaults.executable);

        let prompter = ScriptedPrompter::default();
        let table = FailingTable;
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_executable().unwrap();
        assert_eq!(resolved.source, ResolutionSource::DefaultLocation);
    }

    #[test]
    fn declining_executable_retry_aborts() {
        let mut env = test_env();
        let prompter = ScriptedPrompter::with_executables(vec![None], vec![false]);
        let table = NoProcessTable;
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let result = resolver.resolve_executable();
        assert!(matches!(result, Err(WalletSwitchError::UserAborted)));
        assert_eq!(env.settings.wallet_exec, None);
    }

    #[test]
    fn executable_retry_after_cancel_succeeds() {
        let mut env = test_env();
        let picked = env.root.join("second-try").join("dogecoin-qt.exe");
        touch(&picked);

        let prompter =
            ScriptedPrompter::with_executables(vec![None, Some(picked.clone())], vec![true]);
        let table = NoProcessTable;
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_executable().unwrap();
        assert_eq!(resolved.source, ResolutionSource::UserPrompt);
        assert_eq!(resolved.path, picked);
        assert_eq!(prompter.prompt_count(), 2);
    }

    #[test]
    fn nonexistent_pick_is_rejected_and_retried() {
        let mut env = test_env();
        let ghost = env.root.join("ghost.exe");
        let real = env.root.join("real.exe");
        touch(&real);

        let prompter =
            ScriptedPrompter::with_executables(vec![Some(ghost), Some(real.clone())], vec![true]);
        let table = NoProcessTable;
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_executable().unwrap();
        assert_eq!(resolved.path, real);
        assert_eq!(prompter.prompt_count(), 2);
    }

    #[test]
    fn second_resolution_reuses_persisted_path_without_prompting() {
        let mut env = test_env();
        let picked = env.root.join("picked.exe");
        touch(&picked);

        let prompter = ScriptedPrompter::with_executables(vec![Some(picked.clone())], vec![]);
        let table = NoProcessTable;

        let first = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        )
        .resolve_executable()
        .unwrap();
        assert_eq!(first.source, ResolutionSource::UserPrompt);
        assert_eq!(prompter.prompt_count(), 1);

        let second = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        )
        .resolve_executable()
        .unwrap();
        assert_eq!(second.source, ResolutionSource::SavedSetting);
        assert_eq!(second.path, picked);
        assert_eq!(prompter.prompt_count(), 1);
    }

    #[test]
    fn saved_data_directory_short_circuits() {
        let mut env = test_env();
        let saved = env.root.join("wallet-data");
        fs::create_dir_all(&saved).unwrap();
        env.settings.data_dir = Some(saved.clone());

        let prompter = ScriptedPrompter::default();
        let table = NoProcessTable;
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_data_directory().unwrap();
        assert_eq!(resolved.source, ResolutionSource::SavedSetting);
        assert_eq!(resolved.path, saved);
        assert_eq!(prompter.prompt_count(), 0);
    }

    #[test]
    fn default_data_directory_needs_no_sentinel() {
        let mut env = test_env();
        // Present but empty: the conventional location is trusted as-is.
        fs::create_dir_all(&env.defaults.data_dir).unwrap();

        let prompter = ScriptedPrompter::default();
        let table = NoProcessTable;
        let expected = env.defaults.data_dir.clone();
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_data_directory().unwrap();
        assert_eq!(resolved.source, ResolutionSource::DefaultLocation);
        assert_eq!(resolved.path, expected);
        assert_eq!(env.store.load().unwrap().data_dir, Some(expected));
    }

    #[test]
    fn picked_data_directory_must_contain_block_index() {
        let mut env = test_env();
        let bare = env.root.join("bare");
        fs::create_dir_all(&bare).unwrap();
        let good = env.root.join("good");
        fs::create_dir_all(&good).unwrap();
        touch(&good.join(catalog::BLOCK_INDEX_FILE));

        let prompter =
            ScriptedPrompter::with_folders(vec![Some(bare), Some(good.clone())], vec![true]);
        let table = NoProcessTable;
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_data_directory().unwrap();
        assert_eq!(resolved.source, ResolutionSource::UserPrompt);
        assert_eq!(resolved.path, good);
        assert_eq!(prompter.prompt_count(), 2);
    }

    #[test]
    fn declining_data_directory_retry_aborts() {
        let mut env = test_env();
        let prompter = ScriptedPrompter::with_folders(vec![None], vec![false]);
        let table = NoProcessTable;
        let mut resolver = PathResolver::with_defaults(
            &env.store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let result = resolver.resolve_data_directory();
        assert!(matches!(result, Err(WalletSwitchError::UserAborted)));
        assert_eq!(env.settings.data_dir, None);
    }

    #[test]
    fn persist_failure_does_not_fail_resolution() {
        let mut env = test_env();
        touch(&env.defaults.executable);
        // Parent of the settings path is a regular file, so saving fails.
        let blocker = env.root.join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let store = SettingsStore::new(blocker.join("settings.json"));

        let prompter = ScriptedPrompter::default();
        let table = NoProcessTable;
        let mut resolver = PathResolver::with_defaults(
            &store,
            &mut env.settings,
            &table,
            &prompter,
            env.defaults.clone(),
        );

        let resolved = resolver.resolve_executable().unwrap();
        assert_eq!(resolved.source, ResolutionSource::DefaultLocation);
        assert_eq!(env.settings.wallet_exec, Some(env.defaults.executable));
    }
}
