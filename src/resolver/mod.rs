//! Resolution of the wallet executable and data directory paths
//!
//! Startup needs two paths before anything else can happen: the wallet
//! executable to launch and the data directory holding the wallet
//! files. This module finds both through fixed fallback chains that
//! prefer remembered settings, then conventional locations, and only
//! then ask the user. See [`PathResolver`] for the exact chains.

pub mod path_resolver;
pub mod prompt;

pub use path_resolver::{
    PathResolver, ResolutionSource, ResolvedKind, ResolvedPath, ResolverDefaults,
};
#[cfg(windows)]
pub use prompt::DialogPrompter;
pub use prompt::Prompter;
