//! Wallet catalog: discovery of loadable wallet files
//!
//! A wallet data directory mixes the files this application cares about
//! (wallet databases, `*.dat`) with bookkeeping files the wallet software
//! maintains for itself: block-data segments (`blk0001.dat`, ...), the
//! database index (`blkindex.dat`) and the network peer cache
//! (`peers.dat`). The catalog enumerates the directory and keeps only the
//! names a user can actually load.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Extension shared by every loadable wallet file
pub const WALLET_EXTENSION: &str = ".dat";

/// Database index file whose presence marks a directory as a wallet data
/// directory
pub const BLOCK_INDEX_FILE: &str = "blkindex.dat";

const BLOCK_INDEX_PREFIX: &str = "blkindex";
const PEERS_PREFIX: &str = "peers";

/// Identifier of a wallet: its file name without the `.dat` extension
///
/// The identifier doubles as the tray menu label and as the value passed
/// to the wallet application via `-wallet=<identifier>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletId(String);

impl WalletId {
    /// Identifier from a bare stem, used when the name is already known good
    pub fn new(stem: impl Into<String>) -> Self {
        Self(stem.into())
    }

    /// Derive an identifier from a directory entry name
    ///
    /// Returns `None` for names the catalog excludes: block-data segments
    /// (`blk0001.dat`), the database index (`blkindex*`), peer caches
    /// (`peers*`), names without the exact `.dat` extension, and the bare
    /// extension itself.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        if !is_wallet_file(file_name) {
            return None;
        }
        file_name
            .strip_suffix(WALLET_EXTENSION)
            .filter(|stem| !stem.is_empty())
            .map(|stem| Self(stem.to_string()))
    }

    /// The identifier as shown in the tray menu
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Command-line argument that makes the wallet application load this
    /// wallet, e.g. `-wallet=wallet2`
    pub fn launch_arg(&self) -> String {
        format!("-wallet={}", self.0)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a file name denotes a loadable wallet
///
/// The extension check is an exact suffix match: `wallet.dat_2` and
/// `wallet.data` are not wallets.
pub fn is_wallet_file(file_name: &str) -> bool {
    if !file_name.ends_with(WALLET_EXTENSION) {
        return false;
    }
    if has_block_segment_prefix(file_name) {
        return false;
    }
    !(file_name.starts_with(BLOCK_INDEX_PREFIX) || file_name.starts_with(PEERS_PREFIX))
}

/// Whether a name starts with `blk` followed by four digits, the naming
/// scheme of block-data segment files
fn has_block_segment_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 7 && name.starts_with("blk") && bytes[3..7].iter().all(u8::is_ascii_digit)
}

/// List the loadable wallets in a data directory, sorted by identifier
///
/// Only direct children are considered. Entries that are not regular
/// files or have non-Unicode names are skipped.
pub fn list_wallets(data_dir: &Path) -> Result<Vec<WalletId>> {
    let mut wallets = Vec::new();

    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        if let Some(id) = WalletId::from_file_name(&file_name) {
            wallets.push(id);
        }
    }

    wallets.sort();
    debug!(
        "Found {} wallet file(s) in {}",
        wallets.len(),
        data_dir.display()
    );
    Ok(wallets)
}
