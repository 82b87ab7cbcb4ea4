use super::{ModeContext, ModeHandler, ModeKind, Outcome};
use crate::region::RecordingRegion;
use crate::scene::{Color, CursorHint, DrawCommand, Scene};
use crate::Point;
use log::error;

/// Encoder running; the overlay is click-through and only stop is allowed
#[derive(Debug, Default)]
pub struct RecordingMode;

impl ModeHandler for RecordingMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Recording
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.region.reset_state();
        ctx.surface.show();
        ctx.controls.set_recording(true);
        ctx.controls.show();
    }

    fn handle_mouse_motion(&mut self, ctx: &mut ModeContext<'_>, _at: Point) -> Outcome {
        ctx.surface.set_cursor(CursorHint::Arrow);
        Outcome::none()
    }

    fn toggle_recording(&mut self, ctx: &mut ModeContext<'_>) -> Outcome {
        let finished = {
            let mut recorder = ctx.recorder.lock();
            if let Err(e) = recorder.stop() {
                error!("Failed to stop recording: {}", e);
            }
            recorder.output_path().map(|p| p.to_path_buf())
        };
        ctx.controls.set_recording(false);

        Outcome {
            finished,
            ..Outcome::transition(ModeKind::Waiting)
        }
    }

    fn draw_overlay(&self, region: &RecordingRegion, _screen: (i32, i32), scene: &mut Scene) {
        scene.push(DrawCommand::FillScreen(Color::BLACK));
        region.draw(true, scene);
    }

    fn transparency(&self) -> f32 {
        0.7
    }

    fn captures_clicks(&self, _recording: bool) -> bool {
        false
    }
}
