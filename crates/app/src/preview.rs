//! Hand finished recordings to the shell

use crate::clipboard::copy_files_to_clipboard;
use capture::VideoEditor;
use log::{debug, info};
use overlay::{OverlayError, OverlayResult, RecordingHandoff};
use settings::SettingsStore;
use std::path::{Path, PathBuf};
use windows::core::{w, HSTRING};
use windows::Win32::UI::Shell::ShellExecuteW;
use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

/// `ShellExecuteW` values at or below this are error codes.
const SHELL_EXECUTE_ERROR_MAX: isize = 32;

/// Open `path` with the user's default video player
pub fn open_with_default_player(path: &Path) -> OverlayResult<()> {
    let file = HSTRING::from(path.as_os_str());
    let result = unsafe { ShellExecuteW(None, w!("open"), &file, None, None, SW_SHOWNORMAL) };

    let code = result.0 as isize;
    if code <= SHELL_EXECUTE_ERROR_MAX {
        return Err(OverlayError::Handoff(format!(
            "ShellExecute could not open {} (code {})",
            path.display(),
            code
        )));
    }
    info!("Opened preview for {}", path.display());
    Ok(())
}

/// Saved edits, clipboard copy and default-player preview
pub struct ShellHandoff {
    settings: SettingsStore,
}

impl ShellHandoff {
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }
}

impl RecordingHandoff for ShellHandoff {
    fn process(&mut self, path: &Path) -> OverlayResult<PathBuf> {
        let Some(plan) = self.settings.post_edit() else {
            return Ok(path.to_path_buf());
        };
        debug!("Applying post-recording edits {:?}", plan);
        let mut editor = VideoEditor::open(path)?;
        Ok(editor.apply(&plan)?)
    }

    fn copy_to_clipboard(&mut self, paths: &[PathBuf]) -> OverlayResult<()> {
        copy_files_to_clipboard(paths)?;
        info!("Recording copied to clipboard");
        Ok(())
    }

    fn open_preview(&mut self, path: &Path) -> OverlayResult<()> {
        open_with_default_player(path)
    }
}
