//! Seam between the controller and the windowing layer

use crate::controls::ControlsPanel;
use crate::scene::{CursorHint, Scene};
use crate::{OverlayResult, Point};

/// Window operations the controller needs
///
/// Failures of the OS calls that can fail are returned so the controller can
/// log them; nothing here may block on user input.
pub trait OverlaySurface {
    fn show(&mut self);

    fn hide(&mut self);

    /// Whole-window opacity in `0.0..=1.0`
    fn set_alpha(&mut self, alpha: f32);

    /// `true` lets mouse input fall through to the windows below
    fn set_click_through(&mut self, pass_through: bool) -> OverlayResult<()>;

    fn present(&mut self, scene: &Scene);

    fn set_cursor(&mut self, cursor: CursorHint);

    /// Show, hide, move or repaint the panel to match the model
    fn update_controls(&mut self, panel: &ControlsPanel, origin: (i32, i32));

    /// Put the panel back above the overlay
    fn raise_controls(&mut self) -> OverlayResult<()>;
}

/// Input collected by the surface, in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    MouseDown(Point),
    /// Pointer moved with the left button held
    MouseDrag(Point),
    MouseUp(Point),
    MouseMotion(Point),
    PanelDown(Point),
    PanelDrag(Point),
    PanelUp(Point),
    Escape,
}
