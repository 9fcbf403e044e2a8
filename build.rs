fn main() {
    // Embed Windows resources (version info)
    #[cfg(windows)]
    {
        let mut res = winres::WindowsResource::new();
        res.set("ProductName", "WalletSwitch");
        res.set("FileDescription", "Wallet switcher for Dogecoin Core");
        res.set("CompanyName", "WalletSwitch Contributors");
        res.set("LegalCopyright", "Copyright © 2026 WalletSwitch Contributors");
        res.set("OriginalFilename", "walletswitch.exe");
        res.set("FileVersion", env!("CARGO_PKG_VERSION"));
        res.set("ProductVersion", env!("CARGO_PKG_VERSION"));
        res.compile().unwrap();
    }
}
