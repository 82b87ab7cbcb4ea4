//! Global hotkeys
//!
//! Alt+S is registered for the whole session. Escape is only registered while
//! the overlay is on screen so other applications keep receiving it.

use log::{debug, info};
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_ALT, MOD_NOREPEAT, VK_ESCAPE,
};

pub const HOTKEY_SHOW: i32 = 1;
pub const HOTKEY_HIDE: i32 = 2;

const SHOW_KEY: u32 = b'S' as u32;

pub struct Hotkeys {
    hwnd: HWND,
    show_registered: bool,
    hide_registered: bool,
}

impl Hotkeys {
    pub fn new(hwnd: HWND) -> Self {
        Self {
            hwnd,
            show_registered: false,
            hide_registered: false,
        }
    }

    pub fn register_show(&mut self) -> windows::core::Result<()> {
        unsafe { RegisterHotKey(self.hwnd, HOTKEY_SHOW, MOD_ALT | MOD_NOREPEAT, SHOW_KEY)? };
        self.show_registered = true;
        info!("Registered Alt+S");
        Ok(())
    }

    /// Track overlay visibility with the Escape registration
    pub fn set_hide_enabled(&mut self, enabled: bool) -> windows::core::Result<()> {
        if enabled == self.hide_registered {
            return Ok(());
        }

        unsafe {
            if enabled {
                RegisterHotKey(self.hwnd, HOTKEY_HIDE, HOT_KEY_MODIFIERS(0), VK_ESCAPE.0 as u32)?;
            } else {
                UnregisterHotKey(self.hwnd, HOTKEY_HIDE)?;
            }
        }
        self.hide_registered = enabled;
        debug!("Escape hotkey {}", if enabled { "registered" } else { "released" });
        Ok(())
    }
}

impl Drop for Hotkeys {
    fn drop(&mut self) {
        unsafe {
            if self.show_registered {
                let _ = UnregisterHotKey(self.hwnd, HOTKEY_SHOW);
            }
            if self.hide_registered {
                let _ = UnregisterHotKey(self.hwnd, HOTKEY_HIDE);
            }
        }
    }
}
