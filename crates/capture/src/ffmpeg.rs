//! FFmpeg command line and executable discovery

use crate::{CaptureError, CaptureRegion, CaptureResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment override for the ffmpeg executable
pub const FFMPEG_ENV: &str = "SCREENRECORDER_FFMPEG";

#[cfg(windows)]
const FFMPEG_NAMES: &[&str] = &["ffmpeg.exe", "ffmpeg"];
#[cfg(not(windows))]
const FFMPEG_NAMES: &[&str] = &["ffmpeg"];

/// Screen grabbing input device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureBackend {
    /// Windows GDI desktop grabber
    GdiGrab,
    /// X11 display grabber
    X11Grab { display: String },
}

impl CaptureBackend {
    /// Pick the grabber for the host OS
    pub fn detect() -> CaptureResult<Self> {
        if cfg!(windows) {
            Ok(CaptureBackend::GdiGrab)
        } else if cfg!(target_os = "linux") {
            let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0.0".to_string());
            Ok(CaptureBackend::X11Grab { display })
        } else {
            Err(CaptureError::UnsupportedPlatform(std::env::consts::OS))
        }
    }
}

/// Build the ffmpeg argument list (without the program name)
pub fn build_ffmpeg_args(
    backend: &CaptureBackend,
    framerate: u32,
    region: Option<CaptureRegion>,
    output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-framerate"].map(OsString::from).to_vec();
    args.push(framerate.to_string().into());

    match backend {
        CaptureBackend::GdiGrab => {
            args.extend(["-f", "gdigrab"].map(OsString::from));
            if let Some(r) = region {
                args.extend(
                    [
                        "-offset_x".to_string(),
                        r.x.to_string(),
                        "-offset_y".to_string(),
                        r.y.to_string(),
                        "-video_size".to_string(),
                        format!("{}x{}", r.width, r.height),
                    ]
                    .map(OsString::from),
                );
            }
            args.extend(["-draw_mouse", "1", "-i", "desktop"].map(OsString::from));
        }
        CaptureBackend::X11Grab { display } => {
            args.extend(["-f", "x11grab"].map(OsString::from));
            match region {
                Some(r) => args.extend(
                    [
                        "-video_size".to_string(),
                        format!("{}x{}", r.width, r.height),
                        "-i".to_string(),
                        format!("{}+{},{}", display, r.x, r.y),
                    ]
                    .map(OsString::from),
                ),
                None => args.extend(["-i".to_string(), display.clone()].map(OsString::from)),
            }
        }
    }

    args.extend(["-vcodec", "libx264", "-pix_fmt", "yuv420p"].map(OsString::from));
    args.push(output.as_os_str().to_owned());
    args
}

/// Find the ffmpeg executable
///
/// Order: `SCREENRECORDER_FFMPEG`, `bin/` next to the running executable,
/// then every directory on `PATH`.
pub fn locate_ffmpeg() -> CaptureResult<PathBuf> {
    if let Some(path) = std::env::var_os(FFMPEG_ENV).map(PathBuf::from) {
        if path.is_file() {
            return Ok(path);
        }
        log::warn!("{} points at missing file {}", FFMPEG_ENV, path.display());
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let path_var = std::env::var_os("PATH");

    candidate_paths(exe_dir.as_deref(), path_var.as_deref())
        .into_iter()
        .find(|p| p.is_file())
        .ok_or(CaptureError::FfmpegNotFound)
}

fn candidate_paths(exe_dir: Option<&Path>, path_var: Option<&std::ffi::OsStr>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = exe_dir {
        dirs.push(dir.join("bin"));
    }
    if let Some(var) = path_var {
        dirs.extend(std::env::split_paths(var));
    }

    dirs.iter()
        .flat_map(|dir| FFMPEG_NAMES.iter().map(move |name| dir.join(name)))
        .collect()
}
