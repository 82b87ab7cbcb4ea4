use super::{ModeContext, ModeHandler, ModeKind, Outcome};
use crate::region::RecordingRegion;
use crate::scene::{Color, CursorHint, DrawCommand, Scene, SceneRect};
use crate::Point;
use capture::CaptureRegion;
use log::{debug, info};

pub const SELECT_MESSAGE: &str = "Click-and-drag to select a region";
pub const INVALID_REGION_MESSAGE: &str = "Invalid region, try again";

const MESSAGE_SIZE: i32 = 24;
const OUTLINE_WIDTH: i32 = 2;

/// Rubber-band selection of a new region
#[derive(Debug, Default)]
pub struct SelectingMode {
    start: Option<Point>,
    current: Option<Point>,
    rejected: bool,
}

impl SelectingMode {
    fn message(&self) -> &'static str {
        if self.rejected {
            INVALID_REGION_MESSAGE
        } else {
            SELECT_MESSAGE
        }
    }
}

impl ModeHandler for SelectingMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Selecting
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>) {
        *self = Self::default();
        ctx.region.reset_state();
        ctx.controls.hide();
        ctx.surface.show();
    }

    fn exit(&mut self, _ctx: &mut ModeContext<'_>) {
        self.start = None;
        self.current = None;
    }

    fn handle_mouse_down(&mut self, _ctx: &mut ModeContext<'_>, at: Point) -> Outcome {
        self.start = Some(at);
        self.current = None;
        self.rejected = false;
        Outcome::redraw()
    }

    fn handle_mouse_drag(&mut self, ctx: &mut ModeContext<'_>, at: Point) -> Outcome {
        if self.start.is_none() || ctx.region.is_operating() {
            return Outcome::none();
        }
        self.current = Some(at);
        Outcome::redraw()
    }

    fn handle_mouse_up(&mut self, ctx: &mut ModeContext<'_>, at: Point) -> Outcome {
        if ctx.region.is_operating() {
            return Outcome::none();
        }
        let Some(start) = self.start.take() else {
            return Outcome::none();
        };
        self.current = None;

        let region = CaptureRegion::from_corners(start.x, start.y, at.x, at.y);
        if !region.is_valid() {
            debug!("Rejected selection {:?}", region);
            self.rejected = true;
            return Outcome::redraw();
        }

        info!("Selected region {:?}", region);
        ctx.recorder.lock().set_region(Some(region));
        ctx.settings.set_region(region);
        Outcome::transition(ModeKind::Ready)
    }

    fn handle_mouse_motion(&mut self, ctx: &mut ModeContext<'_>, _at: Point) -> Outcome {
        ctx.surface.set_cursor(CursorHint::Crosshair);
        Outcome::none()
    }

    fn draw_overlay(&self, _region: &RecordingRegion, screen: (i32, i32), scene: &mut Scene) {
        scene.push(DrawCommand::FillScreen(Color::BLACK));

        if let (Some(a), Some(b)) = (self.start, self.current) {
            scene.push(DrawCommand::StrokeRect {
                rect: SceneRect {
                    left: a.x.min(b.x),
                    top: a.y.min(b.y),
                    right: a.x.max(b.x),
                    bottom: a.y.max(b.y),
                },
                color: Color::WHITE,
                width: OUTLINE_WIDTH,
            });
        }

        scene.push(DrawCommand::Text {
            text: self.message().to_string(),
            x: screen.0 / 2,
            y: screen.1 / 2,
            color: Color::WHITE,
            size: MESSAGE_SIZE,
        });
    }

    fn transparency(&self) -> f32 {
        0.4
    }

    fn captures_clicks(&self, _recording: bool) -> bool {
        true
    }
}
