//! Interactive path prompts
//!
//! When automatic path resolution runs out of options it falls back to
//! asking the user. [`Prompter`] is the seam: the production
//! implementation shows native dialogs via `rfd`, tests script their
//! answers.

use std::path::PathBuf;

/// Interactive fallback used by path resolution
pub trait Prompter {
    /// Ask the user to locate the wallet executable
    ///
    /// Returns `None` when the dialog is dismissed.
    fn pick_executable(&self, executable_file_name: &str) -> Option<PathBuf>;

    /// Ask the user to pick the wallet data directory
    ///
    /// Returns `None` when the dialog is dismissed.
    fn pick_data_directory(&self) -> Option<PathBuf>;

    /// Ask whether to retry a failed resolution round
    ///
    /// Returns `true` to run the prompt again, `false` to give up.
    fn ask_retry(&self, message: &str) -> bool;
}

/// [`Prompter`] backed by native file and message dialogs
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogPrompter;

#[cfg(windows)]
impl Prompter for DialogPrompter {
    fn pick_executable(&self, executable_file_name: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title(format!("Locate {executable_file_name}"))
            .add_filter(executable_file_name, &["exe"])
            .pick_file()
    }

    fn pick_data_directory(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select the wallet data directory")
            .pick_folder()
    }

    fn ask_retry(&self, message: &str) -> bool {
        let choice = rfd::MessageDialog::new()
            .set_title("WalletSwitch - Error")
            .set_description(message)
            .set_buttons(rfd::MessageButtons::OkCancelCustom(
                "Retry".to_string(),
                "Cancel".to_string(),
            ))
            .set_level(rfd::MessageLevel::Error)
            .show();

        matches!(choice, rfd::MessageDialogResult::Custom(label) if label == "Retry")
    }
}
