//! System tray implementation

use crate::icon::{and_mask, to_bgra, tray_icon_image, ICON_SIZE};
use log::warn;
use windows::core::w;
use windows::Win32::Foundation::{HWND, POINT};
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreateIcon, CreatePopupMenu, DestroyIcon, DestroyMenu, GetCursorPos, SetForegroundWindow,
    SetMenuDefaultItem, TrackPopupMenu, HICON, MF_STRING, TPM_BOTTOMALIGN, TPM_LEFTALIGN,
    TPM_NONOTIFY, TPM_RETURNCMD, WM_USER,
};

/// Tray icon callback message
pub const WM_TRAYICON: u32 = WM_USER + 1;

const ID_TRAY_RECORD: u32 = 1001;
const ID_TRAY_QUIT: u32 = 1002;

/// Menu item picked by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    Record,
    Quit,
}

/// System tray manager
pub struct SystemTray {
    hwnd: HWND,
    nid: NOTIFYICONDATAW,
    icon: Option<HICON>,
    visible: bool,
}

impl SystemTray {
    pub fn new(hwnd: HWND) -> Self {
        let mut nid = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: 1,
            uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP,
            uCallbackMessage: WM_TRAYICON,
            ..Default::default()
        };

        let tip: Vec<u16> = "ScreenRecorder".encode_utf16().collect();
        let len = tip.len().min(nid.szTip.len() - 1);
        nid.szTip[..len].copy_from_slice(&tip[..len]);

        Self {
            hwnd,
            nid,
            icon: None,
            visible: false,
        }
    }

    pub fn show(&mut self) -> windows::core::Result<()> {
        if self.visible {
            return Ok(());
        }

        let image = tray_icon_image(ICON_SIZE);
        let color = to_bgra(&image);
        let mask = and_mask(ICON_SIZE);

        unsafe {
            let icon = CreateIcon(
                None,
                ICON_SIZE as i32,
                ICON_SIZE as i32,
                1,
                32,
                mask.as_ptr(),
                color.as_ptr(),
            )?;
            self.icon = Some(icon);
            self.nid.hIcon = icon;

            Shell_NotifyIconW(NIM_ADD, &self.nid).ok()?;
        }
        self.visible = true;
        Ok(())
    }

    pub fn hide(&mut self) {
        unsafe {
            if self.visible {
                let _ = Shell_NotifyIconW(NIM_DELETE, &self.nid);
                self.visible = false;
            }
            if let Some(icon) = self.icon.take() {
                let _ = DestroyIcon(icon);
            }
        }
    }

    /// Show the context menu at the cursor and return the chosen item
    pub fn show_context_menu(&self) -> windows::core::Result<Option<TrayAction>> {
        unsafe {
            let menu = CreatePopupMenu()?;
            AppendMenuW(menu, MF_STRING, ID_TRAY_RECORD as usize, w!("Record (Alt+S)"))?;
            AppendMenuW(menu, MF_STRING, ID_TRAY_QUIT as usize, w!("Quit"))?;
            if let Err(e) = SetMenuDefaultItem(menu, ID_TRAY_RECORD, 0) {
                warn!("Failed to mark default tray item: {}", e);
            }

            let mut pt = POINT::default();
            let _ = GetCursorPos(&mut pt);

            // The menu only dismisses on outside clicks when the owner is foreground.
            let _ = SetForegroundWindow(self.hwnd);
            let chosen = TrackPopupMenu(
                menu,
                TPM_LEFTALIGN | TPM_BOTTOMALIGN | TPM_RETURNCMD | TPM_NONOTIFY,
                pt.x,
                pt.y,
                0,
                self.hwnd,
                None,
            );
            let _ = DestroyMenu(menu);

            Ok(match chosen.0 as u32 {
                ID_TRAY_RECORD => Some(TrayAction::Record),
                ID_TRAY_QUIT => Some(TrayAction::Quit),
                _ => None,
            })
        }
    }
}

impl Drop for SystemTray {
    fn drop(&mut self) {
        self.hide();
    }
}
