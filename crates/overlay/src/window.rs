//! Win32 overlay surface
//!
//! A layered, top-most popup covering the primary screen plus a small popup
//! for the controls panel. Window procedures never call back into the
//! controller: they queue [`SurfaceEvent`]s that the message loop drains.

use crate::controls::ControlsPanel;
use crate::render::{paint_panel, paint_scene};
use crate::scene::{Color, CursorHint, Scene};
use crate::surface::{OverlaySurface, SurfaceEvent};
use crate::{OverlayError, OverlayResult, Point};
use crossbeam_channel::Sender;
use log::warn;
use once_cell::sync::OnceCell;
use std::cell::RefCell;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{
    COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, POINT, SetLastError, WIN32_ERROR, WPARAM,
};
use windows::Win32::Graphics::Gdi::{ClientToScreen, InvalidateRect};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture, VK_ESCAPE};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, GetSystemMetrics, GetWindowLongW, LoadCursorW,
    RegisterClassExW, SetCursor, SetForegroundWindow, SetLayeredWindowAttributes, SetWindowLongW,
    SetWindowPos, ShowWindow, GWL_EXSTYLE, HTCLIENT, HWND_TOPMOST, IDC_ARROW, IDC_CROSS,
    IDC_SIZEALL, IDC_SIZENESW, IDC_SIZENS, IDC_SIZENWSE, IDC_SIZEWE, LWA_ALPHA, LWA_COLORKEY,
    MA_NOACTIVATE, SM_CXSCREEN, SM_CYSCREEN, SWP_FRAMECHANGED, SWP_NOACTIVATE, SWP_NOMOVE,
    SWP_NOSIZE, SWP_NOZORDER, SWP_SHOWWINDOW, SW_HIDE, SW_SHOW, WM_ERASEBKGND, WM_KEYDOWN,
    WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MOUSEACTIVATE, WM_MOUSEMOVE, WM_PAINT, WM_SETCURSOR,
    WNDCLASSEXW, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST,
    WS_EX_TRANSPARENT, WS_POPUP,
};

const OVERLAY_CLASS: PCWSTR = w!("ScreenRecorderOverlay");
const PANEL_CLASS: PCWSTR = w!("ScreenRecorderControls");
const MK_LBUTTON: usize = 0x0001;

static CLASSES: OnceCell<()> = OnceCell::new();

/// State the window procedures read while painting and forwarding input
#[derive(Default)]
struct WindowState {
    scene: Scene,
    cursor: CursorHint,
    panel: Option<ControlsPanel>,
    events: Option<Sender<SurfaceEvent>>,
}

thread_local! {
    static WINDOW_STATE: RefCell<WindowState> = RefCell::new(WindowState::default());
}

/// Size of the primary screen in physical pixels
pub fn primary_screen_size() -> (i32, i32) {
    unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) }
}

fn register_classes() -> OverlayResult<()> {
    CLASSES.get_or_try_init(|| unsafe {
        let hmodule = GetModuleHandleW(None)?;
        let hinstance = HINSTANCE(hmodule.0);

        let overlay = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: Some(overlay_wnd_proc),
            hInstance: hinstance,
            lpszClassName: OVERLAY_CLASS,
            ..Default::default()
        };
        let panel = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: Some(panel_wnd_proc),
            hInstance: hinstance,
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            lpszClassName: PANEL_CLASS,
            ..Default::default()
        };

        for class in [&overlay, &panel] {
            if RegisterClassExW(class) == 0 {
                return Err(OverlayError::from(windows::core::Error::from_win32()));
            }
        }
        Ok(())
    })?;
    Ok(())
}

pub struct Win32Surface {
    overlay: HWND,
    panel: HWND,
    alpha: u8,
}

impl Win32Surface {
    /// Create both windows hidden; input is sent to `events`
    pub fn new(events: Sender<SurfaceEvent>) -> OverlayResult<Self> {
        register_classes()?;
        WINDOW_STATE.with(|s| s.borrow_mut().events = Some(events));

        let (width, height) = primary_screen_size();
        let (panel_width, panel_height) = ControlsPanel::size();

        unsafe {
            let hmodule = GetModuleHandleW(None)?;
            let hinstance = HINSTANCE(hmodule.0);

            let overlay = CreateWindowExW(
                WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
                OVERLAY_CLASS,
                w!("ScreenRecorder Overlay"),
                WS_POPUP,
                0,
                0,
                width,
                height,
                None,
                None,
                hinstance,
                None,
            )?;

            let panel = CreateWindowExW(
                WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
                PANEL_CLASS,
                w!("ScreenRecorder Controls"),
                WS_POPUP,
                0,
                0,
                panel_width,
                panel_height,
                None,
                None,
                hinstance,
                None,
            )?;

            let surface = Self {
                overlay,
                panel,
                alpha: u8::MAX,
            };
            surface.apply_layering()?;
            Ok(surface)
        }
    }

    fn apply_layering(&self) -> OverlayResult<()> {
        unsafe {
            SetLayeredWindowAttributes(
                self.overlay,
                COLORREF(Color::TRANSPARENT_KEY.to_colorref()),
                self.alpha,
                LWA_COLORKEY | LWA_ALPHA,
            )?;
        }
        Ok(())
    }
}

impl OverlaySurface for Win32Surface {
    fn show(&mut self) {
        unsafe {
            let _ = ShowWindow(self.overlay, SW_SHOW);
            let _ = SetForegroundWindow(self.overlay);
        }
    }

    fn hide(&mut self) {
        unsafe {
            let _ = ShowWindow(self.overlay, SW_HIDE);
        }
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        if let Err(e) = self.apply_layering() {
            warn!("Failed to set overlay alpha: {}", e);
        }
    }

    fn set_click_through(&mut self, pass_through: bool) -> OverlayResult<()> {
        unsafe {
            let style = GetWindowLongW(self.overlay, GWL_EXSTYLE);
            let transparent = WS_EX_TRANSPARENT.0 as i32;
            let updated = if pass_through {
                style | transparent
            } else {
                style & !transparent
            };
            if updated == style {
                return Ok(());
            }

            SetLastError(WIN32_ERROR(0));
            if SetWindowLongW(self.overlay, GWL_EXSTYLE, updated) == 0 {
                let err = windows::core::Error::from_win32();
                if err.code().is_err() {
                    return Err(OverlayError::ClickThrough(err.message()));
                }
            }

            SetWindowPos(
                self.overlay,
                None,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE | SWP_FRAMECHANGED,
            )?;
        }
        Ok(())
    }

    fn present(&mut self, scene: &Scene) {
        WINDOW_STATE.with(|s| s.borrow_mut().scene = scene.clone());
        unsafe {
            let _ = InvalidateRect(self.overlay, None, false);
        }
    }

    fn set_cursor(&mut self, cursor: CursorHint) {
        WINDOW_STATE.with(|s| s.borrow_mut().cursor = cursor);
        apply_cursor(cursor);
    }

    fn update_controls(&mut self, panel: &ControlsPanel, origin: (i32, i32)) {
        WINDOW_STATE.with(|s| s.borrow_mut().panel = Some(panel.clone()));

        unsafe {
            if !panel.is_visible() {
                let _ = ShowWindow(self.panel, SW_HIDE);
                return;
            }

            let (width, height) = ControlsPanel::size();
            if let Err(e) = SetWindowPos(
                self.panel,
                HWND_TOPMOST,
                origin.0,
                origin.1,
                width,
                height,
                SWP_NOACTIVATE | SWP_SHOWWINDOW,
            ) {
                warn!("Failed to place controls: {}", e);
            }
            let _ = InvalidateRect(self.panel, None, false);
        }
    }

    fn raise_controls(&mut self) -> OverlayResult<()> {
        unsafe {
            SetWindowPos(
                self.panel,
                HWND_TOPMOST,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )?;
        }
        Ok(())
    }
}

impl Drop for Win32Surface {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyWindow(self.panel);
            let _ = DestroyWindow(self.overlay);
        }
        WINDOW_STATE.with(|s| *s.borrow_mut() = WindowState::default());
    }
}

fn apply_cursor(cursor: CursorHint) {
    let id = match cursor {
        CursorHint::Arrow => IDC_ARROW,
        CursorHint::Crosshair => IDC_CROSS,
        CursorHint::Move => IDC_SIZEALL,
        CursorHint::ResizeNS => IDC_SIZENS,
        CursorHint::ResizeEW => IDC_SIZEWE,
        CursorHint::ResizeNWSE => IDC_SIZENWSE,
        CursorHint::ResizeNESW => IDC_SIZENESW,
    };
    unsafe {
        if let Ok(handle) = LoadCursorW(None, id) {
            SetCursor(handle);
        }
    }
}

fn emit(event: SurfaceEvent) {
    WINDOW_STATE.with(|s| {
        if let Some(events) = &s.borrow().events {
            let _ = events.send(event);
        }
    });
}

/// Client coordinates from `lparam`, converted to screen coordinates
unsafe fn screen_point(hwnd: HWND, lparam: LPARAM) -> Point {
    let mut pt = POINT {
        x: (lparam.0 & 0xFFFF) as i16 as i32,
        y: ((lparam.0 >> 16) & 0xFFFF) as i16 as i32,
    };
    let _ = ClientToScreen(hwnd, &mut pt);
    Point::new(pt.x, pt.y)
}

unsafe extern "system" fn overlay_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_PAINT => {
            let scene = WINDOW_STATE.with(|s| s.borrow().scene.clone());
            paint_scene(hwnd, &scene);
            LRESULT(0)
        }

        WM_ERASEBKGND => LRESULT(1),

        WM_SETCURSOR if (lparam.0 & 0xFFFF) as u32 == HTCLIENT => {
            apply_cursor(WINDOW_STATE.with(|s| s.borrow().cursor));
            LRESULT(1)
        }

        WM_LBUTTONDOWN => {
            SetCapture(hwnd);
            emit(SurfaceEvent::MouseDown(screen_point(hwnd, lparam)));
            LRESULT(0)
        }

        WM_MOUSEMOVE => {
            let at = screen_point(hwnd, lparam);
            if wparam.0 & MK_LBUTTON != 0 {
                emit(SurfaceEvent::MouseDrag(at));
            } else {
                emit(SurfaceEvent::MouseMotion(at));
            }
            LRESULT(0)
        }

        WM_LBUTTONUP => {
            let _ = ReleaseCapture();
            emit(SurfaceEvent::MouseUp(screen_point(hwnd, lparam)));
            LRESULT(0)
        }

        WM_KEYDOWN if wparam.0 == VK_ESCAPE.0 as usize => {
            emit(SurfaceEvent::Escape);
            LRESULT(0)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

unsafe extern "system" fn panel_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_PAINT => {
            let panel = WINDOW_STATE.with(|s| s.borrow().panel.clone());
            match panel {
                Some(panel) => paint_panel(hwnd, &panel),
                None => return DefWindowProcW(hwnd, msg, wparam, lparam),
            }
            LRESULT(0)
        }

        WM_ERASEBKGND => LRESULT(1),

        WM_MOUSEACTIVATE => LRESULT(MA_NOACTIVATE as isize),

        WM_LBUTTONDOWN => {
            SetCapture(hwnd);
            emit(SurfaceEvent::PanelDown(screen_point(hwnd, lparam)));
            LRESULT(0)
        }

        WM_MOUSEMOVE if wparam.0 & MK_LBUTTON != 0 => {
            emit(SurfaceEvent::PanelDrag(screen_point(hwnd, lparam)));
            LRESULT(0)
        }

        WM_LBUTTONUP => {
            let _ = ReleaseCapture();
            emit(SurfaceEvent::PanelUp(screen_point(hwnd, lparam)));
            LRESULT(0)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
