//! Overlay module for ScreenRecorder
//!
//! Full-screen region selection and the mode machine that drives the
//! recorder. The Win32 surface is only built on Windows; everything else is
//! platform-neutral.

pub mod controller;
pub mod controls;
pub mod mode;
pub mod region;
pub mod scene;
pub mod surface;

#[cfg(windows)]
pub mod render;
#[cfg(windows)]
pub mod window;

pub use controller::{OverlayCommand, OverlayController, RecordingHandoff};
pub use controls::{ControlButton, ControlsPanel, PanelAction};
pub use mode::ModeKind;
pub use region::{RecordingRegion, RegionConfig, ResizeZone, Zone};
pub use scene::{Color, CursorHint, DrawCommand, Scene, SceneRect};
pub use surface::{OverlaySurface, SurfaceEvent};
#[cfg(windows)]
pub use window::{primary_screen_size, Win32Surface};

use capture::RecorderSession;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Windows(#[from] windows::core::Error),

    #[error("Click-through update failed: {0}")]
    ClickThrough(String),

    #[error("Recording hand-off failed: {0}")]
    Handoff(String),

    #[error(transparent)]
    Capture(#[from] capture::CaptureError),
}

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Recorder shared between the controller and the region accessors
pub type SharedRecorder = Arc<Mutex<dyn RecorderSession>>;

/// Screen-space point in physical pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
