//! Copy finished recordings to the clipboard as files

use std::path::{Path, PathBuf};

/// Standard clipboard format for a list of files
pub const CF_HDROP: u32 = 15;

/// `DROPFILES`: offset to the list, drop point, non-client flag, wide flag
const DROPFILES_SIZE: u32 = 20;

fn wide_path(path: &Path) -> Vec<u16> {
    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        path.as_os_str().encode_wide().collect()
    }
    #[cfg(not(windows))]
    {
        path.to_string_lossy().encode_utf16().collect()
    }
}

/// `CF_HDROP` payload: a `DROPFILES` header followed by NUL-separated wide
/// paths and a final extra NUL.
pub fn drop_files_payload(paths: &[PathBuf]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&DROPFILES_SIZE.to_le_bytes());
    payload.extend_from_slice(&0i32.to_le_bytes());
    payload.extend_from_slice(&0i32.to_le_bytes());
    payload.extend_from_slice(&0i32.to_le_bytes());
    payload.extend_from_slice(&1i32.to_le_bytes());

    for path in paths {
        for unit in wide_path(path).into_iter().chain(std::iter::once(0)) {
            payload.extend_from_slice(&unit.to_le_bytes());
        }
    }
    payload.extend_from_slice(&0u16.to_le_bytes());
    payload
}

#[cfg(windows)]
pub use win32::copy_files_to_clipboard;

#[cfg(windows)]
mod win32 {
    use super::{drop_files_payload, CF_HDROP};
    use log::debug;
    use std::path::PathBuf;
    use std::time::Duration;
    use windows::Win32::Foundation::HANDLE;
    use windows::Win32::System::DataExchange::{
        CloseClipboard, EmptyClipboard, OpenClipboard, SetClipboardData,
    };
    use windows::Win32::System::Memory::{GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock, GMEM_MOVEABLE};

    const OPEN_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_millis(50);

    /// Closes the clipboard when dropped
    struct OpenedClipboard;

    impl OpenedClipboard {
        fn open() -> windows::core::Result<Self> {
            let mut attempt = 0;
            loop {
                match unsafe { OpenClipboard(None) } {
                    Ok(()) => return Ok(Self),
                    Err(e) if attempt + 1 >= OPEN_RETRIES => return Err(e),
                    Err(e) => {
                        debug!("Clipboard busy ({}), retrying", e);
                        attempt += 1;
                        std::thread::sleep(RETRY_DELAY);
                    }
                }
            }
        }
    }

    impl Drop for OpenedClipboard {
        fn drop(&mut self) {
            let _ = unsafe { CloseClipboard() };
        }
    }

    /// Replace the clipboard contents with `paths` as a file list
    pub fn copy_files_to_clipboard(paths: &[PathBuf]) -> windows::core::Result<()> {
        let payload = drop_files_payload(paths);
        let _clipboard = OpenedClipboard::open()?;

        unsafe {
            EmptyClipboard()?;

            let memory = GlobalAlloc(GMEM_MOVEABLE, payload.len())?;
            let target = GlobalLock(memory) as *mut u8;
            if target.is_null() {
                let _ = GlobalFree(memory);
                return Err(windows::core::Error::from_win32());
            }
            std::ptr::copy_nonoverlapping(payload.as_ptr(), target, payload.len());
            let _ = GlobalUnlock(memory);

            // The clipboard owns the memory once this succeeds.
            if let Err(e) = SetClipboardData(CF_HDROP, HANDLE(memory.0)) {
                let _ = GlobalFree(memory);
                return Err(e);
            }
        }
        debug!("Copied {} file(s) to clipboard", paths.len());
        Ok(())
    }
}
