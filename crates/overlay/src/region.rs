//! Drag and resize handling for the capture region
//!
//! The region itself lives in the recorder session; this type only reads and
//! writes it through the accessors it is constructed with, so it works
//! without a window.

use crate::scene::{Color, CursorHint, DrawCommand, Scene, SceneRect};
use crate::Point;
use capture::CaptureRegion;

/// Tunables for region interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionConfig {
    /// Distance from an edge that still counts as grabbing it
    pub resize_margin: i32,
    /// Resizing never shrinks an axis below this
    pub min_size: i32,
    /// Gap between the recorded pixels and the border drawn while recording
    pub border_offset: i32,
    pub border_width: i32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            resize_margin: 8,
            min_size: 20,
            border_offset: 3,
            border_width: 2,
        }
    }
}

/// Edge or corner being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeZone {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeZone {
    fn moves_top(self) -> bool {
        matches!(self, ResizeZone::N | ResizeZone::NE | ResizeZone::NW)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, ResizeZone::S | ResizeZone::SE | ResizeZone::SW)
    }

    fn moves_left(self) -> bool {
        matches!(self, ResizeZone::W | ResizeZone::NW | ResizeZone::SW)
    }

    fn moves_right(self) -> bool {
        matches!(self, ResizeZone::E | ResizeZone::NE | ResizeZone::SE)
    }

    pub fn cursor(self) -> CursorHint {
        match self {
            ResizeZone::N | ResizeZone::S => CursorHint::ResizeNS,
            ResizeZone::E | ResizeZone::W => CursorHint::ResizeEW,
            ResizeZone::NW | ResizeZone::SE => CursorHint::ResizeNWSE,
            ResizeZone::NE | ResizeZone::SW => CursorHint::ResizeNESW,
        }
    }
}

/// Where a point falls relative to the region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Edge(ResizeZone),
    Inside,
}

/// Accessors into whoever owns the region
pub struct RegionAccess {
    pub get: Box<dyn Fn() -> Option<CaptureRegion>>,
    pub set: Box<dyn Fn(CaptureRegion)>,
    pub screen_size: Box<dyn Fn() -> (i32, i32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Idle,
    Drag {
        offset: Point,
        original: CaptureRegion,
    },
    Resize {
        zone: ResizeZone,
        anchor: Point,
        original: CaptureRegion,
    },
}

/// Region drag/resize state machine
pub struct RecordingRegion {
    config: RegionConfig,
    access: RegionAccess,
    operation: Operation,
}

impl RecordingRegion {
    pub fn new(config: RegionConfig, access: RegionAccess) -> Self {
        Self {
            config,
            access,
            operation: Operation::Idle,
        }
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    pub fn current(&self) -> Option<CaptureRegion> {
        (self.access.get)()
    }

    /// Drop any in-progress drag or resize
    pub fn reset_state(&mut self) {
        self.operation = Operation::Idle;
    }

    pub fn is_point_in_region(&self, x: i32, y: i32) -> bool {
        self.current().is_some_and(|r| r.contains(x, y))
    }

    /// Classify a point; corners win over edges where margins overlap.
    pub fn resize_zone_at(&self, x: i32, y: i32) -> Option<Zone> {
        let region = self.current()?;
        let m = self.config.resize_margin;

        if x < region.x - m || x > region.right() + m || y < region.y - m || y > region.bottom() + m {
            return None;
        }

        let near_left = (x - region.x).abs() <= m;
        let near_right = (x - region.right()).abs() <= m;
        let near_top = (y - region.y).abs() <= m;
        let near_bottom = (y - region.bottom()).abs() <= m;

        let edge = match (near_top, near_bottom, near_left, near_right) {
            (true, _, true, _) => Some(ResizeZone::NW),
            (true, _, _, true) => Some(ResizeZone::NE),
            (_, true, true, _) => Some(ResizeZone::SW),
            (_, true, _, true) => Some(ResizeZone::SE),
            (true, _, _, _) => Some(ResizeZone::N),
            (_, true, _, _) => Some(ResizeZone::S),
            (_, _, true, _) => Some(ResizeZone::W),
            (_, _, _, true) => Some(ResizeZone::E),
            _ => None,
        };

        match edge {
            Some(zone) => Some(Zone::Edge(zone)),
            None if region.contains(x, y) => Some(Zone::Inside),
            None => None,
        }
    }

    /// Begin moving the region; only from strictly inside it
    pub fn start_drag(&mut self, x: i32, y: i32) -> bool {
        let Some(region) = self.current() else {
            return false;
        };
        if self.resize_zone_at(x, y) != Some(Zone::Inside) {
            return false;
        }

        self.operation = Operation::Drag {
            offset: Point::new(x - region.x, y - region.y),
            original: region,
        };
        true
    }

    /// Begin resizing; only from an edge or corner zone
    pub fn start_resize(&mut self, x: i32, y: i32) -> bool {
        let Some(region) = self.current() else {
            return false;
        };
        let Some(Zone::Edge(zone)) = self.resize_zone_at(x, y) else {
            return false;
        };

        self.operation = Operation::Resize {
            zone,
            anchor: Point::new(x, y),
            original: region,
        };
        true
    }

    /// Move the region so it follows the pointer, kept fully on screen
    pub fn handle_drag(&mut self, x: i32, y: i32) -> bool {
        let Operation::Drag { offset, original } = self.operation else {
            return false;
        };

        let (sw, sh) = (self.access.screen_size)();
        let w = original.width as i32;
        let h = original.height as i32;
        let new_x = (x - offset.x).min(sw - w).max(0);
        let new_y = (y - offset.y).min(sh - h).max(0);

        (self.access.set)(CaptureRegion::new(new_x, new_y, original.width, original.height));
        true
    }

    /// Move the grabbed edges by the pointer's travel since the resize began
    pub fn handle_resize(&mut self, x: i32, y: i32) -> bool {
        let Operation::Resize { zone, anchor, original } = self.operation else {
            return false;
        };

        let (sw, sh) = (self.access.screen_size)();
        let min = self.config.min_size;
        let (rx, ry) = (original.x, original.y);
        let (rw, rh) = (original.width as i32, original.height as i32);
        let dx = x - anchor.x;
        let dy = y - anchor.y;

        let (mut nx, mut ny, mut nw, mut nh) = (rx, ry, rw, rh);

        if zone.moves_top() {
            ny = (ry + dy).max(0);
            nh = (rh - (ny - ry)).max(min);
            if nh == min {
                // Pin the bottom edge instead of flipping past it. A region
                // already under the floor grows downwards from the screen top.
                ny = (ry + rh - min).max(0);
            }
        }
        if zone.moves_bottom() {
            nh = (rh + dy).max(min).min(sh - ry);
        }
        if zone.moves_left() {
            nx = (rx + dx).max(0);
            nw = (rw - (nx - rx)).max(min);
            if nw == min {
                nx = (rx + rw - min).max(0);
            }
        }
        if zone.moves_right() {
            nw = (rw + dx).max(min).min(sw - rx);
        }

        nw = nw.min(sw - nx);
        nh = nh.min(sh - ny);
        // Too close to the far screen edge to fit the floor: slide back.
        if nw < min {
            nw = min.min(sw);
            nx = sw - nw;
        }
        if nh < min {
            nh = min.min(sh);
            ny = sh - nh;
        }
        nw = even_within(nw, sw - nx);
        nh = even_within(nh, sh - ny);

        (self.access.set)(CaptureRegion::new(nx, ny, nw.max(0) as u32, nh.max(0) as u32));
        true
    }

    /// End the current gesture; the caller persists the region afterwards.
    pub fn finish_operation(&mut self) -> bool {
        let was_operating = self.is_operating();
        self.reset_state();
        was_operating
    }

    pub fn is_operating(&self) -> bool {
        !matches!(self.operation, Operation::Idle)
    }

    /// Cursor to show for a pointer at this position
    pub fn cursor_at(&self, x: i32, y: i32) -> CursorHint {
        match self.resize_zone_at(x, y) {
            Some(Zone::Edge(zone)) => zone.cursor(),
            Some(Zone::Inside) => CursorHint::Move,
            None => CursorHint::Arrow,
        }
    }

    /// Append the region to the scene
    ///
    /// While recording only a border outside the captured pixels is drawn and
    /// the area inside is punched through with the colour key. Otherwise the
    /// region gets an opaque placeholder fill: the colour key would make the
    /// region transparent to the mouse and break drag/resize.
    pub fn draw(&self, is_recording: bool, scene: &mut Scene) {
        let Some(region) = self.current() else {
            return;
        };

        let mut rect = SceneRect::from(region);
        let fill = if is_recording {
            rect = rect.inflate(self.config.border_offset);
            Color::TRANSPARENT_KEY
        } else {
            Color::REGION_FILL
        };

        scene.push(DrawCommand::FillRect { rect, color: fill });
        scene.push(DrawCommand::StrokeRect {
            rect,
            color: Color::WHITE,
            width: self.config.border_width,
        });
    }
}

/// Round an odd length up to even, or down when up would cross `limit`.
fn even_within(len: i32, limit: i32) -> i32 {
    if len % 2 == 0 {
        len
    } else if len + 1 <= limit {
        len + 1
    } else {
        len - 1
    }
}
