//! Hidden window that owns the tray icon, hotkeys and timers

use crate::hotkeys::{HOTKEY_HIDE, HOTKEY_SHOW};
use crate::tray::WM_TRAYICON;
use crossbeam_channel::Sender;
use once_cell::sync::OnceCell;
use std::cell::RefCell;
use std::time::Duration;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, KillTimer, PostQuitMessage, RegisterClassExW,
    SetTimer, WINDOW_EX_STYLE, WM_CLOSE, WM_DESTROY, WM_HOTKEY, WM_LBUTTONDBLCLK, WM_RBUTTONUP,
    WM_TIMER, WNDCLASSEXW, WS_OVERLAPPED,
};

/// Panel stacking is re-asserted this often while the region is adjustable
pub const STACKING_INTERVAL: Duration = Duration::from_millis(500);
/// Wakes the loop so commands from other threads are picked up
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_millis(1000);

const TIMER_STACKING: usize = 1;
const TIMER_KEEP_ALIVE: usize = 2;

/// Something the host window received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    ShowHotkey,
    HideHotkey,
    TrayActivate,
    TrayMenu,
    StackingTick,
    KeepAlive,
}

static HOST_CLASS: OnceCell<()> = OnceCell::new();

thread_local! {
    static HOST_EVENTS: RefCell<Option<Sender<HostEvent>>> = const { RefCell::new(None) };
}

pub struct HostWindow {
    hwnd: HWND,
}

impl HostWindow {
    const CLASS_NAME: PCWSTR = w!("ScreenRecorderHost");

    pub fn create(events: Sender<HostEvent>) -> windows::core::Result<Self> {
        HOST_EVENTS.with(|slot| *slot.borrow_mut() = Some(events));

        unsafe {
            let hmodule = GetModuleHandleW(None)?;
            let hinstance = HINSTANCE(hmodule.0);

            HOST_CLASS.get_or_try_init(|| {
                let wc = WNDCLASSEXW {
                    cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                    lpfnWndProc: Some(Self::wnd_proc),
                    hInstance: hinstance,
                    lpszClassName: Self::CLASS_NAME,
                    ..Default::default()
                };
                if RegisterClassExW(&wc) == 0 {
                    return Err(windows::core::Error::from_win32());
                }
                Ok(())
            })?;

            // Never shown; it only receives messages.
            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                Self::CLASS_NAME,
                w!("ScreenRecorder"),
                WS_OVERLAPPED,
                0,
                0,
                0,
                0,
                None,
                None,
                hinstance,
                None,
            )?;

            Ok(Self { hwnd })
        }
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    pub fn start_timers(&self) -> windows::core::Result<()> {
        for (id, interval) in [
            (TIMER_STACKING, STACKING_INTERVAL),
            (TIMER_KEEP_ALIVE, KEEP_ALIVE_INTERVAL),
        ] {
            if unsafe { SetTimer(self.hwnd, id, interval.as_millis() as u32, None) } == 0 {
                return Err(windows::core::Error::from_win32());
            }
        }
        Ok(())
    }

    unsafe extern "system" fn wnd_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_HOTKEY => {
                match wparam.0 as i32 {
                    HOTKEY_SHOW => emit(HostEvent::ShowHotkey),
                    HOTKEY_HIDE => emit(HostEvent::HideHotkey),
                    _ => {}
                }
                LRESULT(0)
            }

            WM_TIMER => {
                match wparam.0 {
                    TIMER_STACKING => emit(HostEvent::StackingTick),
                    TIMER_KEEP_ALIVE => emit(HostEvent::KeepAlive),
                    _ => {}
                }
                LRESULT(0)
            }

            WM_TRAYICON => {
                match (lparam.0 & 0xFFFF) as u32 {
                    WM_RBUTTONUP => emit(HostEvent::TrayMenu),
                    WM_LBUTTONDBLCLK => emit(HostEvent::TrayActivate),
                    _ => {}
                }
                LRESULT(0)
            }

            WM_CLOSE => {
                let _ = DestroyWindow(hwnd);
                LRESULT(0)
            }

            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }

            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}

impl Drop for HostWindow {
    fn drop(&mut self) {
        unsafe {
            let _ = KillTimer(self.hwnd, TIMER_STACKING);
            let _ = KillTimer(self.hwnd, TIMER_KEEP_ALIVE);
            let _ = DestroyWindow(self.hwnd);
        }
        HOST_EVENTS.with(|slot| *slot.borrow_mut() = None);
    }
}

fn emit(event: HostEvent) {
    HOST_EVENTS.with(|slot| {
        if let Some(events) = slot.borrow().as_ref() {
            let _ = events.send(event);
        }
    });
}
