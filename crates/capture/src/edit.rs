//! Post-recording edits
//!
//! Trim and scale run ffmpeg on the current file and write a new file next
//! to it; `EditHistory` keeps every version so an edit can be undone.

use crate::ffmpeg::locate_ffmpeg;
use crate::recorder::platform;
use crate::{CaptureError, CaptureResult};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Portion of a recording to keep, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    pub start: f64,
    /// Keep everything after `start` when unset
    pub end: Option<f64>,
}

impl TrimRange {
    /// Clamp to the video, order the ends, and drop ranges that cut nothing
    ///
    /// With a known `duration` both ends are clamped to it and a range
    /// covering the whole video yields `None`.
    pub fn normalized(self, duration: Option<f64>) -> Option<Self> {
        let clamp = |t: f64| {
            let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
            duration.map_or(t, |d| t.min(d))
        };

        let start = clamp(self.start);
        let (start, end) = match self.end.map(clamp) {
            Some(end) if end == start => return None,
            Some(end) if end < start => (end, Some(start)),
            end => (start, end),
        };

        let reaches_end = match (end, duration) {
            (None, _) => true,
            (Some(e), Some(d)) => e >= d,
            (Some(_), None) => false,
        };
        if start == 0.0 && reaches_end {
            return None;
        }
        Some(Self { start, end })
    }

    pub fn duration(&self) -> Option<f64> {
        self.end.map(|end| end - self.start)
    }
}

/// Output frame size; a missing height keeps the aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleTarget {
    pub width: u32,
    pub height: Option<u32>,
}

impl ScaleTarget {
    /// Rounds both sides up to even for yuv420p
    pub fn new(width: u32, height: Option<u32>) -> CaptureResult<Self> {
        if width < 2 || height.is_some_and(|h| h < 2) {
            return Err(CaptureError::InvalidEdit(format!(
                "scale target {}x{} is below 2 pixels",
                width,
                height.map_or_else(|| "auto".to_string(), |h| h.to_string())
            )));
        }
        Ok(Self {
            width: crate::round_up_even(width),
            height: height.map(crate::round_up_even),
        })
    }

    fn filter(&self) -> String {
        // -2 lets ffmpeg pick an even height matching the aspect ratio.
        match self.height {
            Some(h) => format!("scale={}:{}", self.width, h),
            None => format!("scale={}:-2", self.width),
        }
    }
}

fn seconds(value: f64) -> OsString {
    format!("{:.3}", value).into()
}

/// Stream-copy the kept range into `output`
pub fn build_trim_args(input: &Path, range: &TrimRange, output: &Path) -> Vec<OsString> {
    let mut args = vec![OsString::from("-ss"), seconds(range.start), OsString::from("-i")];
    args.push(input.as_os_str().to_owned());
    args.extend(["-c", "copy"].map(OsString::from));
    if let Some(duration) = range.duration() {
        args.push("-t".into());
        args.push(seconds(duration));
    }
    args.push("-y".into());
    args.push(output.as_os_str().to_owned());
    args
}

/// Re-encode `input` at a new size, copying any audio
pub fn build_scale_args(input: &Path, target: &ScaleTarget, output: &Path) -> Vec<OsString> {
    let mut args = vec![OsString::from("-i"), input.as_os_str().to_owned()];
    args.extend(["-vf".to_string(), target.filter()].map(OsString::from));
    args.extend(["-c:a", "copy", "-y"].map(OsString::from));
    args.push(output.as_os_str().to_owned());
    args
}

/// Edits applied automatically to every finished recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Copy the final file here as well
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_dir: Option<PathBuf>,
}

impl EditPlan {
    pub fn is_empty(&self) -> bool {
        self.trim().is_none() && self.width.is_none() && self.save_dir.is_none()
    }

    pub fn trim(&self) -> Option<TrimRange> {
        if self.trim_start.is_none() && self.trim_end.is_none() {
            return None;
        }
        TrimRange {
            start: self.trim_start.unwrap_or(0.0),
            end: self.trim_end,
        }
        .normalized(None)
    }

    pub fn scale(&self) -> CaptureResult<Option<ScaleTarget>> {
        self.width
            .map(|width| ScaleTarget::new(width, self.height))
            .transpose()
    }
}

/// Every version of a recording, newest last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditHistory {
    entries: Vec<PathBuf>,
    current: usize,
}

impl EditHistory {
    pub fn new(original: impl Into<PathBuf>) -> Self {
        Self {
            entries: vec![original.into()],
            current: 0,
        }
    }

    /// Record a new version, forgetting anything that was undone
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.entries.truncate(self.current + 1);
        self.entries.push(path.into());
        self.current += 1;
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn current(&self) -> &Path {
        &self.entries[self.current]
    }

    pub fn original(&self) -> &Path {
        &self.entries[0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs edits against one recording
pub struct VideoEditor {
    ffmpeg: PathBuf,
    work_dir: PathBuf,
    history: EditHistory,
}

impl VideoEditor {
    pub fn new(ffmpeg: impl Into<PathBuf>, work_dir: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            work_dir: work_dir.into(),
            history: EditHistory::new(source),
        }
    }

    /// Edit `source` in its own directory with the discovered ffmpeg
    pub fn open(source: &Path) -> CaptureResult<Self> {
        let work_dir = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        Ok(Self::new(locate_ffmpeg()?, work_dir, source))
    }

    pub fn current(&self) -> &Path {
        self.history.current()
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn trim(&mut self, range: TrimRange) -> CaptureResult<&Path> {
        let input = self.current().to_path_buf();
        let output = self.run(|output| build_trim_args(&input, &range, output))?;
        info!("Trimmed {} to {:?}", input.display(), range);
        self.history.add(output);
        Ok(self.current())
    }

    pub fn scale(&mut self, target: ScaleTarget) -> CaptureResult<&Path> {
        let input = self.current().to_path_buf();
        let output = self.run(|output| build_scale_args(&input, &target, output))?;
        info!("Scaled {} with {}", input.display(), target.filter());
        self.history.add(output);
        Ok(self.current())
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo();
        if undone {
            debug!("Back to {}", self.current().display());
        }
        undone
    }

    /// Copy the current version to `dest`
    pub fn save_as(&self, dest: &Path) -> CaptureResult<()> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(self.current(), dest)?;
        info!("Saved {} to {}", self.current().display(), dest.display());
        Ok(())
    }

    /// Trim, then scale, then save; returns the file to hand on
    pub fn apply(&mut self, plan: &EditPlan) -> CaptureResult<PathBuf> {
        if let Some(range) = plan.trim() {
            self.trim(range)?;
        }
        if let Some(target) = plan.scale()? {
            self.scale(target)?;
        }

        let Some(dir) = plan.save_dir.as_deref() else {
            return Ok(self.current().to_path_buf());
        };
        let name = self
            .history
            .original()
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("screenrecording.mp4"));
        let dest = dir.join(name);
        self.save_as(&dest)?;
        Ok(dest)
    }

    fn run(&self, build: impl FnOnce(&Path) -> Vec<OsString>) -> CaptureResult<PathBuf> {
        let output = self
            .work_dir
            .join(format!("screenrecording_edit_{}.mp4", uuid::Uuid::new_v4()));
        let args = build(&output);
        debug!("Running {} {:?}", self.ffmpeg.display(), args);

        let mut command = Command::new(&self.ffmpeg);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        platform::configure(&mut command);

        let result = command.output().map_err(|source| CaptureError::Spawn {
            path: self.ffmpeg.clone(),
            source,
        })?;
        if result.status.success() {
            return Ok(output);
        }

        if output.exists() {
            if let Err(e) = std::fs::remove_file(&output) {
                warn!("Failed to remove partial edit {}: {}", output.display(), e);
            }
        }
        Err(CaptureError::Encoder {
            status: result.status.to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        })
    }
}
