//! Platform-neutral drawing commands for the overlay surface

use capture::CaptureRegion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Pixels of this colour are see-through and click-through on the layered window
    pub const TRANSPARENT_KEY: Color = Color::rgb(128, 128, 128);
    /// Placeholder fill for an idle region
    pub const REGION_FILL: Color = Color::rgb(0x40, 0x40, 0x40);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Win32 COLORREF layout (0x00BBGGRR)
    pub const fn to_colorref(self) -> u32 {
        self.r as u32 | (self.g as u32) << 8 | (self.b as u32) << 16
    }
}

/// Rectangle in screen coordinates, exclusive right/bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl SceneRect {
    pub fn inflate(self, by: i32) -> Self {
        Self {
            left: self.left - by,
            top: self.top - by,
            right: self.right + by,
            bottom: self.bottom + by,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

impl From<CaptureRegion> for SceneRect {
    fn from(r: CaptureRegion) -> Self {
        Self {
            left: r.x,
            top: r.y,
            right: r.right(),
            bottom: r.bottom(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    FillScreen(Color),
    FillRect { rect: SceneRect, color: Color },
    /// Outline drawn inside `rect`
    StrokeRect { rect: SceneRect, color: Color, width: i32 },
    /// Text centred on `(x, y)`
    Text { text: String, x: i32, y: i32, color: Color, size: i32 },
}

/// Everything the overlay shows for one frame, in paint order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Text of every `Text` command, in order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Mouse cursor the surface should show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorHint {
    #[default]
    Arrow,
    Crosshair,
    Move,
    ResizeNS,
    ResizeEW,
    ResizeNWSE,
    ResizeNESW,
}
