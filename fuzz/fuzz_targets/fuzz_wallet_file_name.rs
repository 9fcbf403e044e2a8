#![no_main]

use libfuzzer_sys::fuzz_target;
use walletswitch::catalog::{WalletId, is_wallet_file};

fuzz_target!(|data: &[u8]| {
    // Run the wallet file filter over arbitrary file names
    if let Ok(name) = std::str::from_utf8(data) {
        let accepted = is_wallet_file(name);
        let id = WalletId::from_file_name(name);

        // An identifier only exists for names the filter accepts
        if id.is_some() {
            assert!(accepted);
        }
    }
});
