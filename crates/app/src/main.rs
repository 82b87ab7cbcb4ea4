//! ScreenRecorder - region screen recorder living in the system tray

#![cfg_attr(windows, windows_subsystem = "windows")]

#[cfg_attr(not(windows), allow(dead_code))]
mod clipboard;
#[cfg_attr(not(windows), allow(dead_code))]
mod icon;

#[cfg(windows)]
mod host;
#[cfg(windows)]
mod hotkeys;
#[cfg(windows)]
mod preview;
#[cfg(windows)]
mod tray;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run()
}

#[cfg(windows)]
fn run() -> anyhow::Result<()> {
    use crate::host::{HostEvent, HostWindow};
    use crate::hotkeys::Hotkeys;
    use crate::preview::ShellHandoff;
    use crate::tray::{SystemTray, TrayAction};
    use capture::{FfmpegRecorder, RecorderConfig};
    use crossbeam_channel::unbounded;
    use log::{error, info, warn};
    use overlay::{
        primary_screen_size, OverlayCommand, OverlayController, RegionConfig, SharedRecorder,
        Win32Surface,
    };
    use parking_lot::Mutex;
    use settings::SettingsStore;
    use std::sync::Arc;
    use windows::Win32::UI::HiDpi::{
        SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, GetMessageW, PostQuitMessage, TranslateMessage, MSG,
    };

    unsafe {
        if let Err(e) = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) {
            warn!("Failed to set DPI awareness: {}", e);
        }
    }

    let settings = SettingsStore::default_location();
    info!("Settings at {}", settings.path().display());

    let recorder: SharedRecorder = Arc::new(Mutex::new(FfmpegRecorder::new(RecorderConfig::default())));

    let (surface_tx, surface_rx) = unbounded();
    let surface = Win32Surface::new(surface_tx)?;
    let handoff = ShellHandoff::new(settings.clone());
    let mut controller = OverlayController::new(
        surface,
        recorder,
        settings,
        primary_screen_size,
        RegionConfig::default(),
    )
    .with_handoff(Box::new(handoff));
    let commands = controller.command_sender();

    let (host_tx, host_rx) = unbounded();
    let host = HostWindow::create(host_tx)?;

    let mut tray = SystemTray::new(host.hwnd());
    tray.show()?;

    let mut hotkeys = Hotkeys::new(host.hwnd());
    if let Err(e) = hotkeys.register_show() {
        // Another program owns the chord; the tray still works.
        error!("Failed to register Alt+S: {}", e);
    }

    host.start_timers()?;
    info!("ScreenRecorder running");

    let mut msg = MSG::default();
    loop {
        let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        if status.0 <= 0 {
            if status.0 < 0 {
                error!("Message loop failed: {}", windows::core::Error::from_win32());
            }
            break;
        }
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        while let Ok(event) = surface_rx.try_recv() {
            controller.handle_event(event);
        }

        while let Ok(event) = host_rx.try_recv() {
            match event {
                HostEvent::ShowHotkey | HostEvent::TrayActivate => controller.show(),
                HostEvent::HideHotkey => controller.hide(),
                HostEvent::StackingTick => controller.reassert_stacking(),
                HostEvent::KeepAlive => {}
                HostEvent::TrayMenu => match tray.show_context_menu() {
                    Ok(Some(TrayAction::Record)) => {
                        if let Err(e) = commands.send(OverlayCommand::Show) {
                            warn!("Failed to queue show command: {}", e);
                        }
                    }
                    Ok(Some(TrayAction::Quit)) => unsafe { PostQuitMessage(0) },
                    Ok(None) => {}
                    Err(e) => warn!("Tray menu failed: {}", e),
                },
            }
        }

        controller.drain_commands();

        if let Err(e) = hotkeys.set_hide_enabled(controller.is_visible()) {
            warn!("Failed to update Escape hotkey: {}", e);
        }
    }

    info!("Shutting down");
    controller.hide();
    tray.hide();
    Ok(())
}

#[cfg(not(windows))]
fn run() -> anyhow::Result<()> {
    log::error!("ScreenRecorder needs Windows for its overlay, tray and hotkeys");
    anyhow::bail!("unsupported platform")
}
