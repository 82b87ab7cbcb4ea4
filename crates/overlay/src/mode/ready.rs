use super::{ModeContext, ModeHandler, ModeKind, Outcome};
use crate::region::RecordingRegion;
use crate::scene::{Color, DrawCommand, Scene};
use crate::Point;
use log::{error, info, warn};

/// Region chosen; it can be moved or resized until recording starts
#[derive(Debug, Default)]
pub struct ReadyMode;

impl ModeHandler for ReadyMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Ready
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.region.reset_state();
        ctx.surface.show();
        ctx.controls.set_recording(false);
        ctx.controls.show();
    }

    fn handle_mouse_down(&mut self, ctx: &mut ModeContext<'_>, at: Point) -> Outcome {
        if ctx.region.current().is_some() && !ctx.region.start_resize(at.x, at.y) {
            ctx.region.start_drag(at.x, at.y);
        }
        Outcome {
            raise_controls: true,
            ..Outcome::none()
        }
    }

    fn handle_mouse_drag(&mut self, ctx: &mut ModeContext<'_>, at: Point) -> Outcome {
        if !ctx.region.is_operating() {
            return Outcome::none();
        }
        let changed = ctx.region.handle_drag(at.x, at.y) || ctx.region.handle_resize(at.x, at.y);
        Outcome {
            redraw: changed,
            raise_controls: changed,
            ..Outcome::none()
        }
    }

    fn handle_mouse_up(&mut self, ctx: &mut ModeContext<'_>, _at: Point) -> Outcome {
        if !ctx.region.is_operating() {
            return Outcome::none();
        }
        if let Some(region) = ctx.region.current() {
            ctx.settings.set_region(region);
        }
        ctx.region.finish_operation();
        Outcome::none()
    }

    fn handle_mouse_motion(&mut self, ctx: &mut ModeContext<'_>, at: Point) -> Outcome {
        ctx.surface.set_cursor(ctx.region.cursor_at(at.x, at.y));
        Outcome::none()
    }

    fn toggle_recording(&mut self, ctx: &mut ModeContext<'_>) -> Outcome {
        let started = {
            let mut recorder = ctx.recorder.lock();
            if let Err(e) = recorder.start() {
                error!("Failed to start recording: {}", e);
            }
            recorder.is_recording()
        };

        if !started {
            warn!("Recorder did not start, staying ready");
            return Outcome::none();
        }

        info!("Recording started");
        ctx.controls.set_recording(true);
        Outcome::transition(ModeKind::Recording)
    }

    fn draw_overlay(&self, region: &RecordingRegion, _screen: (i32, i32), scene: &mut Scene) {
        scene.push(DrawCommand::FillScreen(Color::BLACK));
        region.draw(false, scene);
    }

    fn transparency(&self) -> f32 {
        0.3
    }

    /// Ready can be re-entered from the hotkey while the encoder still runs;
    /// clicks then pass through so the recording is not disturbed.
    fn captures_clicks(&self, recording: bool) -> bool {
        !recording
    }

    fn keeps_controls_on_top(&self) -> bool {
        true
    }
}
