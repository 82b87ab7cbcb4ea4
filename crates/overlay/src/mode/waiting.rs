use super::{ModeContext, ModeHandler, ModeKind};
use crate::region::RecordingRegion;
use crate::scene::Scene;

/// Overlay and panel hidden; only the hotkey or tray brings it back
#[derive(Debug, Default)]
pub struct WaitingMode;

impl ModeHandler for WaitingMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Waiting
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.region.reset_state();
        ctx.controls.hide();
        ctx.surface.hide();
    }

    fn draw_overlay(&self, _region: &RecordingRegion, _screen: (i32, i32), _scene: &mut Scene) {}

    fn transparency(&self) -> f32 {
        0.7
    }

    fn captures_clicks(&self, _recording: bool) -> bool {
        false
    }

    fn is_visible(&self) -> bool {
        false
    }
}
