//! Capture module for ScreenRecorder
//!
//! Owns the capture region model and drives the external ffmpeg encoder.

pub mod edit;
pub mod ffmpeg;
pub mod recorder;

pub use edit::{build_scale_args, build_trim_args, EditHistory, EditPlan, ScaleTarget, TrimRange, VideoEditor};
pub use ffmpeg::{build_ffmpeg_args, locate_ffmpeg, CaptureBackend};
pub use recorder::{FfmpegRecorder, RecorderConfig};

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg executable not found. Put ffmpeg in a 'bin' folder next to the application or on PATH")]
    FfmpegNotFound,

    #[error("Failed to launch encoder {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("FFmpeg exited with {status}: {stderr}")]
    Encoder { status: String, stderr: String },

    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    #[error("Screen recording is not supported on {0}")]
    UnsupportedPlatform(&'static str),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Regions must be strictly larger than this on both axes.
pub const MIN_REGION_SIZE: u32 = 10;

/// Screen rectangle handed to the encoder, in physical pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Normalise two drag corners into a region, rounding the size up to even.
    pub fn from_corners(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: round_up_even((x1 - x0).unsigned_abs()),
            height: round_up_even((y1 - y0).unsigned_abs()),
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Entirely inside a `width` x `height` screen anchored at the origin
    pub fn fits_screen(&self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.right() <= width && self.bottom() <= height
    }

    /// Large enough to record and even on both axes
    pub fn is_valid(&self) -> bool {
        self.width > MIN_REGION_SIZE
            && self.height > MIN_REGION_SIZE
            && self.width % 2 == 0
            && self.height % 2 == 0
    }
}

/// yuv420p needs even dimensions.
pub fn round_up_even(value: u32) -> u32 {
    value + value % 2
}

/// Recorder capability the overlay drives.
///
/// The overlay only ever looks at `is_recording` to decide whether a start
/// succeeded; implementations report their own failures.
pub trait RecorderSession: Send {
    fn region(&self) -> Option<CaptureRegion>;

    fn set_region(&mut self, region: Option<CaptureRegion>);

    fn is_recording(&self) -> bool;

    fn start(&mut self) -> CaptureResult<()>;

    /// Blocks until the encoder has finalised the file.
    fn stop(&mut self) -> CaptureResult<()>;

    /// File produced by the most recent recording, if any
    fn output_path(&self) -> Option<&Path>;
}
