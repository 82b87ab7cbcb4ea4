//! Floating controls panel model
//!
//! Layout, hit-testing and grip dragging live here; the surface only paints
//! what this model describes and forwards pointer events back.

use crate::scene::SceneRect;
use crate::Point;

pub const RECORD_LABEL: &str = "Record";
pub const STOP_LABEL: &str = "Stop";
pub const SELECT_LABEL: &str = "Select region to capture";
pub const CLOSE_LABEL: &str = "Close";

const PADDING: i32 = 6;
const GAP: i32 = 6;
const GRIP_WIDTH: i32 = 18;
const BUTTON_HEIGHT: i32 = 32;
const RECORD_WIDTH: i32 = 84;
const SELECT_WIDTH: i32 = 200;
const CLOSE_WIDTH: i32 = 76;

/// Default panel centre sits at this percentage of screen height
const DEFAULT_HEIGHT_PERCENT: i32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlButton {
    Record,
    SelectRegion,
    Close,
}

impl ControlButton {
    pub const ALL: [ControlButton; 3] =
        [ControlButton::Record, ControlButton::SelectRegion, ControlButton::Close];

    fn width(self) -> i32 {
        match self {
            ControlButton::Record => RECORD_WIDTH,
            ControlButton::SelectRegion => SELECT_WIDTH,
            ControlButton::Close => CLOSE_WIDTH,
        }
    }

    fn action(self) -> PanelAction {
        match self {
            ControlButton::Record => PanelAction::ToggleRecording,
            ControlButton::SelectRegion => PanelAction::SelectRegion,
            ControlButton::Close => PanelAction::Close,
        }
    }
}

/// What a click on the panel asks the controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    ToggleRecording,
    SelectRegion,
    Close,
}

/// Part of the panel under a point in panel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPart {
    Grip,
    Button(ControlButton),
}

/// Result of releasing the pointer over the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelRelease {
    None,
    /// Grip drag ended at this top-left position
    Moved((i32, i32)),
    Action(PanelAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Idle,
    Dragging { grab: Point },
    Pressing(ControlButton),
}

#[derive(Debug, Clone)]
pub struct ControlsPanel {
    visible: bool,
    recording: bool,
    position: Option<(i32, i32)>,
    gesture: Gesture,
}

impl ControlsPanel {
    pub fn new(position: Option<(i32, i32)>) -> Self {
        Self {
            visible: false,
            recording: false,
            position,
            gesture: Gesture::Idle,
        }
    }

    pub fn size() -> (i32, i32) {
        let buttons: i32 = ControlButton::ALL.iter().map(|b| b.width() + GAP).sum();
        (PADDING + GRIP_WIDTH + buttons + PADDING, BUTTON_HEIGHT + PADDING * 2)
    }

    pub fn grip_rect() -> SceneRect {
        let (_, h) = Self::size();
        SceneRect { left: PADDING, top: PADDING, right: PADDING + GRIP_WIDTH, bottom: h - PADDING }
    }

    /// Button rectangle in panel coordinates
    pub fn button_rect(button: ControlButton) -> SceneRect {
        let mut left = PADDING + GRIP_WIDTH + GAP;
        for b in ControlButton::ALL {
            if b == button {
                break;
            }
            left += b.width() + GAP;
        }
        SceneRect {
            left,
            top: PADDING,
            right: left + button.width(),
            bottom: PADDING + BUTTON_HEIGHT,
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.gesture = Gesture::Idle;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn label(&self, button: ControlButton) -> &'static str {
        match button {
            ControlButton::Record if self.recording => STOP_LABEL,
            ControlButton::Record => RECORD_LABEL,
            ControlButton::SelectRegion => SELECT_LABEL,
            ControlButton::Close => CLOSE_LABEL,
        }
    }

    pub fn is_enabled(&self, button: ControlButton) -> bool {
        button == ControlButton::Record || !self.recording
    }

    pub fn is_pressed(&self, button: ControlButton) -> bool {
        self.gesture == Gesture::Pressing(button)
    }

    /// Top-left corner on screen: the saved position, or centred near the bottom
    pub fn origin(&self, screen: (i32, i32)) -> (i32, i32) {
        self.position.unwrap_or_else(|| {
            let (w, h) = Self::size();
            let centre_y = screen.1 * DEFAULT_HEIGHT_PERCENT / 100;
            ((screen.0 - w) / 2, centre_y - h / 2)
        })
    }

    pub fn hit_test(&self, local: Point) -> Option<PanelPart> {
        let inside = |r: SceneRect| {
            local.x >= r.left && local.x < r.right && local.y >= r.top && local.y < r.bottom
        };
        if inside(Self::grip_rect()) {
            return Some(PanelPart::Grip);
        }
        ControlButton::ALL
            .into_iter()
            .find(|b| inside(Self::button_rect(*b)))
            .map(PanelPart::Button)
    }

    /// Pointer pressed at a screen position; true when the panel needs repainting
    pub fn press(&mut self, at: Point, screen: (i32, i32)) -> bool {
        let origin = self.origin(screen);
        let local = Point::new(at.x - origin.0, at.y - origin.1);

        self.gesture = match self.hit_test(local) {
            Some(PanelPart::Grip) => Gesture::Dragging { grab: local },
            Some(PanelPart::Button(b)) if self.is_enabled(b) => Gesture::Pressing(b),
            _ => Gesture::Idle,
        };
        matches!(self.gesture, Gesture::Pressing(_))
    }

    /// Pointer moved with the button held; true when the panel moved
    pub fn drag_to(&mut self, at: Point) -> bool {
        let Gesture::Dragging { grab } = self.gesture else {
            return false;
        };
        self.position = Some((at.x - grab.x, at.y - grab.y));
        true
    }

    pub fn release(&mut self, at: Point, screen: (i32, i32)) -> PanelRelease {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Idle => PanelRelease::None,
            Gesture::Dragging { .. } => PanelRelease::Moved(self.origin(screen)),
            Gesture::Pressing(button) => {
                let origin = self.origin(screen);
                let local = Point::new(at.x - origin.0, at.y - origin.1);
                if self.hit_test(local) == Some(PanelPart::Button(button)) && self.is_enabled(button) {
                    PanelRelease::Action(button.action())
                } else {
                    PanelRelease::None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: (i32, i32) = (1920, 1080);

    fn centre_of(panel: &ControlsPanel, button: ControlButton) -> Point {
        let r = ControlsPanel::button_rect(button);
        let (ox, oy) = panel.origin(SCREEN);
        Point::new(ox + (r.left + r.right) / 2, oy + (r.top + r.bottom) / 2)
    }

    #[test]
    fn default_origin_is_centred_near_bottom() {
        let panel = ControlsPanel::new(None);
        let (w, h) = ControlsPanel::size();
        assert_eq!(panel.origin(SCREEN), ((1920 - w) / 2, 972 - h / 2));
    }

    #[test]
    fn saved_position_wins() {
        let panel = ControlsPanel::new(Some((5, 6)));
        assert_eq!(panel.origin(SCREEN), (5, 6));
    }

    #[test]
    fn buttons_do_not_overlap() {
        let rects: Vec<_> = ControlButton::ALL.iter().map(|b| ControlsPanel::button_rect(*b)).collect();
        for pair in rects.windows(2) {
            assert!(pair[0].right <= pair[1].left);
        }
        assert!(rects[2].right <= ControlsPanel::size().0);
        assert!(ControlsPanel::grip_rect().right <= rects[0].left);
    }

    #[test]
    fn labels_follow_recording_state() {
        let mut panel = ControlsPanel::new(None);
        assert_eq!(panel.label(ControlButton::Record), "Record");
        assert!(panel.is_enabled(ControlButton::Close));

        panel.set_recording(true);
        assert_eq!(panel.label(ControlButton::Record), "Stop");
        assert_eq!(panel.label(ControlButton::SelectRegion), "Select region to capture");
        assert!(panel.is_enabled(ControlButton::Record));
        assert!(!panel.is_enabled(ControlButton::SelectRegion));
        assert!(!panel.is_enabled(ControlButton::Close));
    }

    #[test]
    fn click_maps_to_action() {
        let mut panel = ControlsPanel::new(None);
        let at = centre_of(&panel, ControlButton::SelectRegion);
        assert!(panel.press(at, SCREEN));
        assert!(panel.is_pressed(ControlButton::SelectRegion));
        assert_eq!(panel.release(at, SCREEN), PanelRelease::Action(PanelAction::SelectRegion));
        assert!(!panel.is_pressed(ControlButton::SelectRegion));
    }

    #[test]
    fn release_elsewhere_cancels_click() {
        let mut panel = ControlsPanel::new(None);
        let at = centre_of(&panel, ControlButton::Record);
        panel.press(at, SCREEN);
        let away = centre_of(&panel, ControlButton::Close);
        assert_eq!(panel.release(away, SCREEN), PanelRelease::None);
    }

    #[test]
    fn disabled_buttons_ignore_clicks() {
        let mut panel = ControlsPanel::new(None);
        panel.set_recording(true);
        let at = centre_of(&panel, ControlButton::Close);
        assert!(!panel.press(at, SCREEN));
        assert_eq!(panel.release(at, SCREEN), PanelRelease::None);

        let at = centre_of(&panel, ControlButton::Record);
        panel.press(at, SCREEN);
        assert_eq!(panel.release(at, SCREEN), PanelRelease::Action(PanelAction::ToggleRecording));
    }

    #[test]
    fn grip_drag_moves_panel() {
        let mut panel = ControlsPanel::new(Some((100, 100)));
        let grip = ControlsPanel::grip_rect();
        let start = Point::new(100 + grip.left + 2, 100 + grip.top + 2);

        assert!(!panel.press(start, SCREEN));
        assert!(panel.drag_to(Point::new(start.x + 40, start.y - 30)));
        assert_eq!(panel.origin(SCREEN), (140, 70));
        assert_eq!(panel.release(Point::new(0, 0), SCREEN), PanelRelease::Moved((140, 70)));
        assert!(!panel.drag_to(Point::new(0, 0)));
    }
}
