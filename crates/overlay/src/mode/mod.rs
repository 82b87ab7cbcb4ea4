//! Overlay interaction modes
//!
//! Each mode decides what input means, what the overlay shows and whether the
//! window swallows clicks. Modes never switch themselves: they return an
//! [`Outcome`] and the controller performs the transition.

mod ready;
mod recording;
mod selecting;
mod waiting;

pub use ready::ReadyMode;
pub use recording::RecordingMode;
pub use selecting::{SelectingMode, INVALID_REGION_MESSAGE, SELECT_MESSAGE};
pub use waiting::WaitingMode;

use crate::controls::ControlsPanel;
use crate::region::RecordingRegion;
use crate::scene::Scene;
use crate::surface::OverlaySurface;
use crate::{Point, SharedRecorder};
use settings::SettingsStore;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Waiting,
    Selecting,
    Ready,
    Recording,
}

/// Everything a mode may touch while handling an event
pub struct ModeContext<'a> {
    pub region: &'a mut RecordingRegion,
    pub recorder: &'a SharedRecorder,
    pub settings: &'a SettingsStore,
    pub controls: &'a mut ControlsPanel,
    pub surface: &'a mut dyn OverlaySurface,
}

/// What the controller should do after a mode handled an event
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub next: Option<ModeKind>,
    pub redraw: bool,
    pub raise_controls: bool,
    /// Recording that just finished and should be handed off
    pub finished: Option<PathBuf>,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }

    pub fn transition(next: ModeKind) -> Self {
        Self {
            next: Some(next),
            ..Self::default()
        }
    }
}

pub trait ModeHandler {
    fn kind(&self) -> ModeKind;

    fn enter(&mut self, ctx: &mut ModeContext<'_>);

    fn exit(&mut self, _ctx: &mut ModeContext<'_>) {}

    fn handle_mouse_down(&mut self, _ctx: &mut ModeContext<'_>, _at: Point) -> Outcome {
        Outcome::none()
    }

    fn handle_mouse_drag(&mut self, _ctx: &mut ModeContext<'_>, _at: Point) -> Outcome {
        Outcome::none()
    }

    fn handle_mouse_up(&mut self, _ctx: &mut ModeContext<'_>, _at: Point) -> Outcome {
        Outcome::none()
    }

    fn handle_mouse_motion(&mut self, _ctx: &mut ModeContext<'_>, _at: Point) -> Outcome {
        Outcome::none()
    }

    fn toggle_recording(&mut self, _ctx: &mut ModeContext<'_>) -> Outcome {
        Outcome::none()
    }

    fn draw_overlay(&self, region: &RecordingRegion, screen: (i32, i32), scene: &mut Scene);

    fn transparency(&self) -> f32;

    /// Whether the overlay should take mouse input, given the recorder state
    fn captures_clicks(&self, recording: bool) -> bool;

    fn is_visible(&self) -> bool {
        true
    }

    /// Ready keeps re-raising the panel so the full-screen overlay never covers it
    fn keeps_controls_on_top(&self) -> bool {
        false
    }
}

/// The active mode
pub enum Mode {
    Waiting(WaitingMode),
    Selecting(SelectingMode),
    Ready(ReadyMode),
    Recording(RecordingMode),
}

impl Mode {
    pub fn new(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Waiting => Mode::Waiting(WaitingMode),
            ModeKind::Selecting => Mode::Selecting(SelectingMode::default()),
            ModeKind::Ready => Mode::Ready(ReadyMode),
            ModeKind::Recording => Mode::Recording(RecordingMode),
        }
    }

    pub fn kind(&self) -> ModeKind {
        self.handler().kind()
    }

    pub fn handler(&self) -> &dyn ModeHandler {
        match self {
            Mode::Waiting(m) => m,
            Mode::Selecting(m) => m,
            Mode::Ready(m) => m,
            Mode::Recording(m) => m,
        }
    }

    pub fn handler_mut(&mut self) -> &mut dyn ModeHandler {
        match self {
            Mode::Waiting(m) => m,
            Mode::Selecting(m) => m,
            Mode::Ready(m) => m,
            Mode::Recording(m) => m,
        }
    }
}
