//! System tray integration
//!
//! Builds the tray icon plus wallet menu and runs the Windows message
//! loop that feeds them. The menu lists one check item per wallet file;
//! the checked entry is the wallet most recently handed to the
//! supervisor. Below the wallet list sit rescan, open-data-folder and
//! auto-start actions, then Exit.
//!
//! Selecting a wallet updates the check marks immediately, then runs
//! the stop-wait-relaunch sequence on a worker thread so the menu stays
//! responsive during the bounded exit wait. Worker errors surface as
//! dialogs and the tray keeps running, so the user can simply pick a
//! wallet again.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use tray_icon::menu::{CheckMenuItem, Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIconBuilder};
use windows::Win32::UI::WindowsAndMessaging::{DispatchMessageW, GetMessageW, MSG, PostQuitMessage};

use walletswitch::catalog::{self, WalletId};
use walletswitch::error::{Result, WalletSwitchError, get_user_friendly_error};
use walletswitch::supervisor::WalletSupervisor;
use walletswitch::utils::AutoStartManager;

/// Everything the tray needs to run
pub struct TrayContext {
    /// Wallet executable handed to the supervisor on every switch
    pub executable: PathBuf,
    /// Directory scanned for wallet files
    pub data_dir: PathBuf,
    /// Wallets listed in the menu at startup
    pub wallets: Vec<WalletId>,
    /// Supervisor owning the stop-wait-relaunch sequence
    pub supervisor: Arc<Mutex<WalletSupervisor>>,
}

/// Build the tray icon and block on its menu event loop
///
/// Returns after Exit is chosen. The tray icon lives for the duration
/// of this call; dropping it removes the icon from the tray.
///
/// # Errors
///
/// Returns an error when the menu or tray icon cannot be constructed.
pub fn run(ctx: TrayContext) -> Result<()> {
    info!("Creating system tray icon");

    let menu = WalletMenu::build(ctx.wallets)?;
    let _tray = TrayIconBuilder::new()
        .with_menu(Box::new(menu.menu.clone()))
        .with_icon(build_icon()?)
        .with_tooltip("WalletSwitch")
        .build()
        .map_err(tray_err)?;

    info!(
        "System tray icon created with {} wallet entries",
        menu.wallet_items.len()
    );

    let mut app = TrayApp {
        executable: ctx.executable,
        data_dir: ctx.data_dir,
        supervisor: ctx.supervisor,
        menu,
        selected: None,
    };
    app.run_message_loop();

    Ok(())
}

/// Tray menu with its wallet check items
struct WalletMenu {
    menu: Menu,
    wallet_items: Vec<CheckMenuItem>,
    wallets: Vec<WalletId>,
    /// Disabled hint shown instead of wallet items when none were found
    placeholder: Option<MenuItem>,
    rescan_item: MenuItem,
    open_folder_item: MenuItem,
    autostart_item: CheckMenuItem,
    exit_item: MenuItem,
}

impl WalletMenu {
    fn build(wallets: Vec<WalletId>) -> Result<Self> {
        let menu = Menu::new();

        let wallet_items = make_check_items(&wallets, None);
        for item in &wallet_items {
            menu.append(item).map_err(tray_err)?;
        }
        let placeholder = if wallet_items.is_empty() {
            let item = empty_placeholder();
            menu.append(&item).map_err(tray_err)?;
            Some(item)
        } else {
            None
        };

        menu.append(&PredefinedMenuItem::separator())
            .map_err(tray_err)?;

        let rescan_item = MenuItem::new("Rescan wallets", true, None);
        let open_folder_item = MenuItem::new("Open data folder", true, None);
        let autostart_checked = match AutoStartManager::is_enabled() {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!("Could not read auto-start state: {e}");
                false
            }
        };
        let autostart_item =
            CheckMenuItem::new("Start with Windows", true, autostart_checked, None);
        menu.append(&rescan_item).map_err(tray_err)?;
        menu.append(&open_folder_item).map_err(tray_err)?;
        menu.append(&autostart_item).map_err(tray_err)?;

        menu.append(&PredefinedMenuItem::separator())
            .map_err(tray_err)?;

        let exit_item = MenuItem::new("Exit", true, None);
        menu.append(&exit_item).map_err(tray_err)?;

        debug!("Tray menu created with {} wallet items", wallet_items.len());

        Ok(Self {
            menu,
            wallet_items,
            wallets,
            placeholder,
            rescan_item,
            open_folder_item,
            autostart_item,
            exit_item,
        })
    }

    /// Swap the wallet section of the menu for a fresh listing
    ///
    /// The action items below the separator are left untouched. When
    /// the previously selected wallet is still present it keeps its
    /// check mark.
    fn replace_wallets(
        &mut self,
        wallets: Vec<WalletId>,
        selected: Option<&WalletId>,
    ) -> Result<()> {
        for item in &self.wallet_items {
            self.menu.remove(item).map_err(tray_err)?;
        }
        if let Some(placeholder) = self.placeholder.take() {
            self.menu.remove(&placeholder).map_err(tray_err)?;
        }

        self.wallet_items = make_check_items(&wallets, selected);
        for (position, item) in self.wallet_items.iter().enumerate() {
            self.menu.insert(item, position).map_err(tray_err)?;
        }
        if self.wallet_items.is_empty() {
            let item = empty_placeholder();
            self.menu.insert(&item, 0).map_err(tray_err)?;
            self.placeholder = Some(item);
        }

        self.wallets = wallets;
        Ok(())
    }

    /// Check exactly one wallet item, unchecking all others
    ///
    /// Also repairs the automatic toggle the menu applied on click, so
    /// re-selecting the current wallet leaves it checked.
    fn mark_selected(&self, index: usize) {
        for (i, item) in self.wallet_items.iter().enumerate() {
            item.set_checked(i == index);
        }
    }

    fn wallet_index(&self, id: &MenuId) -> Option<usize> {
        self.wallet_items.iter().position(|item| item.id() == id)
    }
}

fn make_check_items(wallets: &[WalletId], selected: Option<&WalletId>) -> Vec<CheckMenuItem> {
    wallets
        .iter()
        .map(|wallet| CheckMenuItem::new(wallet.as_str(), true, selected == Some(wallet), None))
        .collect()
}

fn empty_placeholder() -> MenuItem {
    MenuItem::new("No wallet files found", false, None)
}

/// Tray state driven by the message loop
struct TrayApp {
    executable: PathBuf,
    data_dir: PathBuf,
    supervisor: Arc<Mutex<WalletSupervisor>>,
    menu: WalletMenu,
    selected: Option<WalletId>,
}

impl TrayApp {
    /// Pump Windows messages until `PostQuitMessage` ends the loop
    ///
    /// Menu events arrive on a channel filled during message dispatch,
    /// so the channel is drained after every dispatched message.
    #[expect(unsafe_code, reason = "Windows message pump drives the tray menu")]
    fn run_message_loop(&mut self) {
        let menu_events = MenuEvent::receiver();

        unsafe {
            let mut msg = MSG::default();
            while GetMessageW(&raw mut msg, None, 0, 0).as_bool() {
                DispatchMessageW(&raw const msg);

                while let Ok(event) = menu_events.try_recv() {
                    self.handle_menu_event(&event);
                }
            }
        }
    }

    fn handle_menu_event(&mut self, event: &MenuEvent) {
        let id = event.id();
        if let Some(index) = self.menu.wallet_index(id) {
            self.select_wallet(index);
        } else if id == self.menu.rescan_item.id() {
            self.rescan();
        } else if id == self.menu.open_folder_item.id() {
            self.open_data_folder();
        } else if id == self.menu.autostart_item.id() {
            toggle_autostart(&self.menu.autostart_item);
        } else if id == self.menu.exit_item.id() {
            info!("Exit selected from tray menu");
            post_quit();
        } else {
            debug!("Unhandled menu event: {id:?}");
        }
    }

    /// Mark the chosen wallet and hand the switch to a worker thread
    fn select_wallet(&mut self, index: usize) {
        let Some(wallet) = self.menu.wallets.get(index).cloned() else {
            return;
        };

        // Mark first so the menu reflects the choice even while the old
        // instance is still shutting down.
        self.menu.mark_selected(index);
        self.selected = Some(wallet.clone());
        info!("Wallet selected: {wallet}");

        let supervisor = Arc::clone(&self.supervisor);
        let executable = self.executable.clone();
        thread::spawn(move || {
            // The lock serializes switches from rapid consecutive clicks.
            let result = supervisor.lock().switch(&executable, &wallet);
            if let Err(e) = result {
                error!("Switch to wallet '{wallet}' failed: {e}");
                show_error_dialog(&get_user_friendly_error(&e));
            }
        });
    }

    fn rescan(&mut self) {
        match catalog::list_wallets(&self.data_dir) {
            Ok(wallets) => {
                info!("Rescan found {} wallet file(s)", wallets.len());
                if let Err(e) = self.menu.replace_wallets(wallets, self.selected.as_ref()) {
                    error!("Failed to rebuild wallet menu: {e}");
                    show_error_dialog(&get_user_friendly_error(&e));
                }
            }
            Err(e) => {
                error!("Wallet rescan failed: {e}");
                show_error_dialog(&get_user_friendly_error(&e));
            }
        }
    }

    fn open_data_folder(&self) {
        if let Err(e) = open::that(&self.data_dir) {
            error!(
                "Failed to open data folder {}: {e}",
                self.data_dir.display()
            );
            show_error_dialog(&format!("Could not open the data folder:\n\n{e}"));
        }
    }
}

/// Apply the auto-start toggle, reverting the mark when it fails
fn toggle_autostart(item: &CheckMenuItem) {
    // The menu flips the mark before the event arrives, so is_checked
    // already reports the desired new state.
    let desired = item.is_checked();
    let result = if desired {
        AutoStartManager::enable()
    } else {
        AutoStartManager::disable()
    };

    match result {
        Ok(()) => info!(
            "Start with Windows {}",
            if desired { "enabled" } else { "disabled" }
        ),
        Err(e) => {
            error!("Failed to update auto-start: {e}");
            item.set_checked(!desired);
            show_error_dialog(&get_user_friendly_error(&e));
        }
    }
}

#[expect(unsafe_code, reason = "PostQuitMessage ends the message loop")]
fn post_quit() {
    unsafe { PostQuitMessage(0) };
}

/// Side length of the generated tray icon in pixels
const ICON_SIZE: usize = 32;

/// Generated 32x32 tray icon: a gold coin disc, no asset files needed
fn build_icon() -> Result<Icon> {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "ICON_SIZE is a small compile-time constant that fits in u32"
    )]
    let side = ICON_SIZE as u32;
    Icon::from_rgba(icon_rgba(), side, side).map_err(tray_err)
}

/// RGBA pixels for the tray icon: gold disc with a darker rim on a
/// transparent square
fn icon_rgba() -> Vec<u8> {
    const CENTER: usize = 16;
    const RADIUS: usize = 14;
    const FILL: (u8, u8, u8) = (0xC2, 0xA6, 0x33);
    const RIM: (u8, u8, u8) = (0x61, 0x53, 0x19);

    let mut rgba = vec![0u8; ICON_SIZE * ICON_SIZE * 4];
    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let dx = x.abs_diff(CENTER);
            let dy = y.abs_diff(CENTER);
            let dist2 = dx * dx + dy * dy;
            if dist2 > RADIUS * RADIUS {
                continue; // transparent outside the disc
            }

            let (r, g, b) = if dist2 >= (RADIUS - 2) * (RADIUS - 2) {
                RIM
            } else {
                FILL
            };
            let idx = (y * ICON_SIZE + x) * 4;
            rgba[idx] = r;
            rgba[idx + 1] = g;
            rgba[idx + 2] = b;
            rgba[idx + 3] = 255;
        }
    }

    rgba
}

fn tray_err(e: impl std::error::Error + Send + Sync + 'static) -> WalletSwitchError {
    WalletSwitchError::TrayError(Box::new(e))
}

/// Shows an error dialog without exiting the application
fn show_error_dialog(message: &str) {
    rfd::MessageDialog::new()
        .set_title("WalletSwitch - Error")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .set_level(rfd::MessageLevel::Error)
        .show();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(rgba: &[u8], x: usize, y: usize) -> &[u8] {
        let idx = (y * ICON_SIZE + x) * 4;
        &rgba[idx..idx + 4]
    }

    #[test]
    fn icon_is_an_opaque_disc_on_a_transparent_square() {
        let rgba = icon_rgba();
        assert_eq!(rgba.len(), ICON_SIZE * ICON_SIZE * 4);

        // Disc center is opaque gold, the rim darker, corners transparent.
        assert_eq!(pixel(&rgba, 16, 16), &[0xC2, 0xA6, 0x33, 255]);
        assert_eq!(pixel(&rgba, 16, 2), &[0x61, 0x53, 0x19, 255]);
        assert_eq!(pixel(&rgba, 0, 0)[3], 0);
        assert_eq!(pixel(&rgba, 31, 31)[3], 0);
    }

    #[test]
    fn check_items_carry_the_selection_mark() {
        let wallets = vec![WalletId::new("alpha"), WalletId::new("beta")];
        let items = make_check_items(&wallets, Some(&wallets[1]));
        assert_eq!(items.len(), 2);
        assert!(!items[0].is_checked());
        assert!(items[1].is_checked());
    }
}
