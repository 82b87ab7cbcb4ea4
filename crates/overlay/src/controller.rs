//! Overlay controller
//!
//! Routes input to the active mode, performs the transitions modes ask for,
//! and keeps the surface (scene, alpha, click-through, panel) in step.

use crate::controls::{ControlsPanel, PanelAction, PanelRelease};
use crate::mode::{Mode, ModeContext, ModeHandler, ModeKind, Outcome};
use crate::region::{RecordingRegion, RegionAccess, RegionConfig};
use crate::scene::Scene;
use crate::surface::{OverlaySurface, SurfaceEvent};
use crate::{OverlayResult, Point, SharedRecorder};
use capture::CaptureRegion;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error, info, warn};
use settings::SettingsStore;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Requests other parts of the app post to the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCommand {
    Show,
    Hide,
    ToggleRecording,
    SelectRegion,
}

/// Where a finished recording goes
pub trait RecordingHandoff {
    /// Post-process the finished file and return the one to hand on
    fn process(&mut self, path: &Path) -> OverlayResult<PathBuf> {
        Ok(path.to_path_buf())
    }

    fn copy_to_clipboard(&mut self, paths: &[PathBuf]) -> OverlayResult<()>;

    fn open_preview(&mut self, path: &Path) -> OverlayResult<()>;
}

pub struct OverlayController<S: OverlaySurface> {
    surface: S,
    mode: Mode,
    region: RecordingRegion,
    recorder: SharedRecorder,
    settings: SettingsStore,
    controls: ControlsPanel,
    handoff: Option<Box<dyn RecordingHandoff>>,
    screen_size: Rc<dyn Fn() -> (i32, i32)>,
    command_tx: Sender<OverlayCommand>,
    command_rx: Receiver<OverlayCommand>,
}

impl<S: OverlaySurface> OverlayController<S> {
    /// Build the controller in Waiting, seeding the recorder with the saved region
    pub fn new(
        surface: S,
        recorder: SharedRecorder,
        settings: SettingsStore,
        screen_size: impl Fn() -> (i32, i32) + 'static,
        config: RegionConfig,
    ) -> Self {
        let screen_size: Rc<dyn Fn() -> (i32, i32)> = Rc::new(screen_size);

        if let Some(saved) = settings.region() {
            let (sw, sh) = screen_size();
            if !saved.is_valid() || !saved.fits_screen(sw, sh) {
                warn!("Ignoring saved region {:?} for a {}x{} screen", saved, sw, sh);
            } else {
                let mut recorder = recorder.lock();
                if recorder.region().is_none() {
                    info!("Restored region {:?}", saved);
                    recorder.set_region(Some(saved));
                }
            }
        }

        let access = {
            let get = recorder.clone();
            let set = recorder.clone();
            let screen = screen_size.clone();
            RegionAccess {
                get: Box::new(move || get.lock().region()),
                set: Box::new(move |region| set.lock().set_region(Some(region))),
                screen_size: Box::new(move || screen()),
            }
        };

        let controls = ControlsPanel::new(settings.panel_position());
        let (command_tx, command_rx) = unbounded();

        let mut controller = Self {
            surface,
            mode: Mode::new(ModeKind::Waiting),
            region: RecordingRegion::new(config, access),
            recorder,
            settings,
            controls,
            handoff: None,
            screen_size,
            command_tx,
            command_rx,
        };
        controller.dispatch(|mode, ctx| mode.enter(ctx));
        controller.sync_controls();
        controller.apply_click_through();
        controller
    }

    pub fn with_handoff(mut self, handoff: Box<dyn RecordingHandoff>) -> Self {
        self.handoff = Some(handoff);
        self
    }

    pub fn command_sender(&self) -> Sender<OverlayCommand> {
        self.command_tx.clone()
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn region(&self) -> Option<CaptureRegion> {
        self.region.current()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.lock().is_recording()
    }

    pub fn is_visible(&self) -> bool {
        self.mode.handler().is_visible()
    }

    pub fn controls(&self) -> &ControlsPanel {
        &self.controls
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Ready when a region exists, otherwise Selecting
    pub fn show(&mut self) {
        let next = if self.region.current().is_some() {
            ModeKind::Ready
        } else {
            ModeKind::Selecting
        };
        self.transition(next);
    }

    /// Stop any recording and go back to Waiting
    ///
    /// A recording stopped this way is not handed off.
    pub fn hide(&mut self) {
        if let Err(e) = self.recorder.lock().stop() {
            error!("Failed to stop recording: {}", e);
        }
        self.transition(ModeKind::Waiting);
    }

    pub fn toggle_recording(&mut self) {
        let outcome = self.dispatch(|mode, ctx| mode.toggle_recording(ctx));
        self.apply(outcome);
    }

    pub fn enter_selecting(&mut self) {
        self.transition(ModeKind::Selecting);
    }

    pub fn mouse_down(&mut self, at: Point) {
        let outcome = self.dispatch(|mode, ctx| mode.handle_mouse_down(ctx, at));
        self.apply(outcome);
    }

    pub fn mouse_drag(&mut self, at: Point) {
        let outcome = self.dispatch(|mode, ctx| mode.handle_mouse_drag(ctx, at));
        self.apply(outcome);
    }

    pub fn mouse_up(&mut self, at: Point) {
        let outcome = self.dispatch(|mode, ctx| mode.handle_mouse_up(ctx, at));
        self.apply(outcome);
    }

    pub fn mouse_motion(&mut self, at: Point) {
        let outcome = self.dispatch(|mode, ctx| mode.handle_mouse_motion(ctx, at));
        self.apply(outcome);
    }

    pub fn panel_mouse_down(&mut self, at: Point) {
        let screen = (self.screen_size)();
        if self.controls.press(at, screen) {
            self.sync_controls();
        }
    }

    pub fn panel_mouse_drag(&mut self, at: Point) {
        if self.controls.drag_to(at) {
            self.sync_controls();
        }
    }

    pub fn panel_mouse_up(&mut self, at: Point) {
        let screen = (self.screen_size)();
        let release = self.controls.release(at, screen);
        self.sync_controls();

        match release {
            PanelRelease::None => {}
            PanelRelease::Moved(position) => {
                debug!("Controls moved to {:?}", position);
                self.settings.set_panel_position(position);
            }
            PanelRelease::Action(action) => self.perform(action),
        }
    }

    pub fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::MouseDown(at) => self.mouse_down(at),
            SurfaceEvent::MouseDrag(at) => self.mouse_drag(at),
            SurfaceEvent::MouseUp(at) => self.mouse_up(at),
            SurfaceEvent::MouseMotion(at) => self.mouse_motion(at),
            SurfaceEvent::PanelDown(at) => self.panel_mouse_down(at),
            SurfaceEvent::PanelDrag(at) => self.panel_mouse_drag(at),
            SurfaceEvent::PanelUp(at) => self.panel_mouse_up(at),
            SurfaceEvent::Escape => self.hide(),
        }
    }

    pub fn execute(&mut self, command: OverlayCommand) {
        debug!("Overlay command {:?}", command);
        match command {
            OverlayCommand::Show => self.show(),
            OverlayCommand::Hide => self.hide(),
            OverlayCommand::ToggleRecording => self.toggle_recording(),
            OverlayCommand::SelectRegion => self.enter_selecting(),
        }
    }

    /// Run every queued command; returns how many ran
    pub fn drain_commands(&mut self) -> usize {
        let mut count = 0;
        while let Ok(command) = self.command_rx.try_recv() {
            self.execute(command);
            count += 1;
        }
        count
    }

    /// Stacking timer tick
    pub fn reassert_stacking(&mut self) {
        if self.mode.handler().keeps_controls_on_top() {
            self.raise_controls();
        }
    }

    /// Repaint the overlay and re-apply alpha and click-through
    pub fn redraw(&mut self) {
        let handler = self.mode.handler();
        if !handler.is_visible() {
            return;
        }

        let mut scene = Scene::new();
        handler.draw_overlay(&self.region, (self.screen_size)(), &mut scene);
        let alpha = handler.transparency();
        let on_top = handler.keeps_controls_on_top();

        self.surface.present(&scene);
        self.surface.set_alpha(alpha);
        self.apply_click_through();
        if on_top {
            self.raise_controls();
        }
    }

    fn perform(&mut self, action: PanelAction) {
        match action {
            PanelAction::ToggleRecording => self.toggle_recording(),
            PanelAction::SelectRegion => self.enter_selecting(),
            PanelAction::Close => self.transition(ModeKind::Waiting),
        }
    }

    fn dispatch<R>(&mut self, f: impl FnOnce(&mut dyn ModeHandler, &mut ModeContext<'_>) -> R) -> R {
        let Self {
            surface,
            mode,
            region,
            recorder,
            settings,
            controls,
            ..
        } = self;
        let mut ctx = ModeContext {
            region,
            recorder,
            settings,
            controls,
            surface,
        };
        f(mode.handler_mut(), &mut ctx)
    }

    fn transition(&mut self, next: ModeKind) {
        let previous = self.mode.kind();
        self.dispatch(|mode, ctx| mode.exit(ctx));
        self.region.reset_state();

        self.mode = Mode::new(next);
        self.dispatch(|mode, ctx| mode.enter(ctx));
        info!("Overlay {:?} -> {:?}", previous, next);

        self.sync_controls();
        if self.mode.handler().is_visible() {
            self.redraw();
        } else {
            self.apply_click_through();
        }
    }

    fn apply(&mut self, outcome: Outcome) {
        let Outcome {
            next,
            redraw,
            raise_controls,
            finished,
        } = outcome;

        match next {
            Some(next) => self.transition(next),
            None if redraw => self.redraw(),
            None => {}
        }
        if raise_controls {
            self.raise_controls();
        }
        if let Some(path) = finished {
            self.hand_off(path);
        }
    }

    fn apply_click_through(&mut self) {
        let recording = self.recorder.lock().is_recording();
        let pass_through = !self.mode.handler().captures_clicks(recording);
        if let Err(e) = self.surface.set_click_through(pass_through) {
            warn!("Failed to set click-through to {}: {}", pass_through, e);
        }
    }

    fn raise_controls(&mut self) {
        if !self.controls.is_visible() {
            return;
        }
        if let Err(e) = self.surface.raise_controls() {
            warn!("Failed to raise controls: {}", e);
        }
    }

    fn sync_controls(&mut self) {
        let origin = self.controls.origin((self.screen_size)());
        self.surface.update_controls(&self.controls, origin);
    }

    fn hand_off(&mut self, path: PathBuf) {
        info!("Recording finished: {}", path.display());
        let Some(handoff) = self.handoff.as_mut() else {
            return;
        };

        let path = match handoff.process(&path) {
            Ok(processed) => processed,
            Err(e) => {
                error!("Failed to edit recording, handing off the original: {}", e);
                path
            }
        };
        if let Err(e) = handoff.copy_to_clipboard(std::slice::from_ref(&path)) {
            error!("Failed to copy recording to clipboard: {}", e);
        }
        if let Err(e) = handoff.open_preview(&path) {
            error!("Failed to open preview: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ControlButton;
    use crate::mode::{INVALID_REGION_MESSAGE, SELECT_MESSAGE};
    use crate::scene::CursorHint;
    use crate::OverlayError;
    use capture::{CaptureError, CaptureResult, RecorderSession};
    use parking_lot::Mutex;
    use std::cell::RefCell;
    use std::sync::Arc;
    use tempfile::TempDir;

    const SCREEN: (i32, i32) = (1920, 1080);

    #[derive(Default)]
    struct FakeSurface {
        visible: bool,
        alpha: f32,
        pass_through: Option<bool>,
        scene: Scene,
        cursor: CursorHint,
        panel_visible: bool,
        panel_recording: bool,
        panel_origin: (i32, i32),
        raises: usize,
        fail_os_calls: bool,
    }

    impl OverlaySurface for FakeSurface {
        fn show(&mut self) {
            self.visible = true;
        }

        fn hide(&mut self) {
            self.visible = false;
        }

        fn set_alpha(&mut self, alpha: f32) {
            self.alpha = alpha;
        }

        fn set_click_through(&mut self, pass_through: bool) -> OverlayResult<()> {
            if self.fail_os_calls {
                return Err(OverlayError::ClickThrough("denied".to_string()));
            }
            self.pass_through = Some(pass_through);
            Ok(())
        }

        fn present(&mut self, scene: &Scene) {
            self.scene = scene.clone();
        }

        fn set_cursor(&mut self, cursor: CursorHint) {
            self.cursor = cursor;
        }

        fn update_controls(&mut self, panel: &ControlsPanel, origin: (i32, i32)) {
            self.panel_visible = panel.is_visible();
            self.panel_recording = panel.is_recording();
            self.panel_origin = origin;
        }

        fn raise_controls(&mut self) -> OverlayResult<()> {
            if self.fail_os_calls {
                return Err(OverlayError::ClickThrough("denied".to_string()));
            }
            self.raises += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeRecorder {
        region: Option<CaptureRegion>,
        recording: bool,
        output: Option<PathBuf>,
        refuse_start: bool,
        stops: usize,
    }

    impl RecorderSession for FakeRecorder {
        fn region(&self) -> Option<CaptureRegion> {
            self.region
        }

        fn set_region(&mut self, region: Option<CaptureRegion>) {
            self.region = region;
        }

        fn is_recording(&self) -> bool {
            self.recording
        }

        fn start(&mut self) -> CaptureResult<()> {
            if self.refuse_start {
                return Err(CaptureError::FfmpegNotFound);
            }
            self.recording = true;
            self.output = Some(PathBuf::from("fake-recording.mp4"));
            Ok(())
        }

        fn stop(&mut self) -> CaptureResult<()> {
            if self.recording {
                self.stops += 1;
            }
            self.recording = false;
            Ok(())
        }

        fn output_path(&self) -> Option<&Path> {
            self.output.as_deref()
        }
    }

    #[derive(Clone, Default)]
    struct FakeHandoff {
        calls: Rc<RefCell<Vec<String>>>,
        fail: bool,
        edited: Option<Result<PathBuf, String>>,
    }

    impl RecordingHandoff for FakeHandoff {
        fn process(&mut self, path: &Path) -> OverlayResult<PathBuf> {
            match &self.edited {
                None => Ok(path.to_path_buf()),
                Some(Ok(edited)) => {
                    self.calls.borrow_mut().push(format!("edit {}", path.display()));
                    Ok(edited.clone())
                }
                Some(Err(reason)) => Err(OverlayError::Capture(CaptureError::InvalidEdit(reason.clone()))),
            }
        }

        fn copy_to_clipboard(&mut self, paths: &[PathBuf]) -> OverlayResult<()> {
            self.calls.borrow_mut().push(format!("clipboard {}", paths.len()));
            if self.fail {
                return Err(OverlayError::Handoff("clipboard busy".to_string()));
            }
            Ok(())
        }

        fn open_preview(&mut self, path: &Path) -> OverlayResult<()> {
            self.calls.borrow_mut().push(format!("preview {}", path.display()));
            if self.fail {
                return Err(OverlayError::Handoff("no player".to_string()));
            }
            Ok(())
        }
    }

    struct Harness {
        controller: OverlayController<FakeSurface>,
        recorder: Arc<Mutex<FakeRecorder>>,
        settings: SettingsStore,
        _dir: TempDir,
    }

    fn harness_with(recorder: FakeRecorder, saved: Option<CaptureRegion>) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = SettingsStore::new(dir.path().join("config.json"));
        if let Some(region) = saved {
            settings.set_region(region);
        }

        let recorder = Arc::new(Mutex::new(recorder));
        let shared: SharedRecorder = recorder.clone();
        let controller = OverlayController::new(
            FakeSurface::default(),
            shared,
            settings.clone(),
            || SCREEN,
            RegionConfig::default(),
        );
        Harness {
            controller,
            recorder,
            settings,
            _dir: dir,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeRecorder::default(), None)
    }

    fn select(controller: &mut OverlayController<FakeSurface>, from: (i32, i32), to: (i32, i32)) {
        controller.mouse_down(Point::new(from.0, from.1));
        controller.mouse_drag(Point::new((from.0 + to.0) / 2, (from.1 + to.1) / 2));
        controller.mouse_drag(Point::new(to.0, to.1));
        controller.mouse_up(Point::new(to.0, to.1));
    }

    fn click_button(controller: &mut OverlayController<FakeSurface>, button: ControlButton) {
        let rect = ControlsPanel::button_rect(button);
        let (ox, oy) = controller.controls().origin(SCREEN);
        let at = Point::new(ox + rect.left + 4, oy + rect.top + 4);
        controller.panel_mouse_down(at);
        controller.panel_mouse_up(at);
    }

    #[test]
    fn starts_waiting_and_click_through() {
        let h = harness();
        assert_eq!(h.controller.mode_kind(), ModeKind::Waiting);
        assert!(!h.controller.surface().visible);
        assert!(!h.controller.surface().panel_visible);
        assert_eq!(h.controller.surface().pass_through, Some(true));
    }

    #[test]
    fn select_record_stop_cycle() {
        let mut h = harness();

        h.controller.show();
        assert_eq!(h.controller.mode_kind(), ModeKind::Selecting);
        assert!(h.controller.surface().visible);
        assert_eq!(h.controller.surface().alpha, 0.4);
        assert_eq!(h.controller.surface().pass_through, Some(false));
        assert!(h.controller.surface().scene.texts().any(|t| t == SELECT_MESSAGE));

        select(&mut h.controller, (10, 10), (210, 160));
        assert_eq!(h.controller.region(), Some(CaptureRegion::new(10, 10, 200, 150)));
        assert_eq!(h.controller.mode_kind(), ModeKind::Ready);
        assert_eq!(h.settings.region(), Some(CaptureRegion::new(10, 10, 200, 150)));
        assert!(h.controller.surface().panel_visible);
        assert_eq!(h.controller.surface().alpha, 0.3);

        h.controller.toggle_recording();
        assert_eq!(h.controller.mode_kind(), ModeKind::Recording);
        assert!(h.controller.is_recording());
        assert!(h.controller.surface().panel_recording);
        assert_eq!(h.controller.surface().pass_through, Some(true));
        assert_eq!(h.controller.surface().alpha, 0.7);

        h.controller.toggle_recording();
        assert_eq!(h.controller.mode_kind(), ModeKind::Waiting);
        assert!(!h.controller.is_recording());
        assert!(!h.controller.surface().visible);
        assert!(h.recorder.lock().output_path().is_some_and(|p| !p.as_os_str().is_empty()));
    }

    #[test]
    fn selections_are_even_and_large_enough() {
        let drags = [
            ((10, 10), (210, 160)),
            ((300, 300), (100, 151)),
            ((5, 5), (16, 16)),
            ((50, 50), (63, 90)),
            ((700, 20), (689, 400)),
        ];
        for (from, to) in drags {
            let mut h = harness();
            h.controller.show();
            select(&mut h.controller, from, to);

            match h.controller.region() {
                Some(r) => {
                    assert_eq!(h.controller.mode_kind(), ModeKind::Ready);
                    assert!(r.width > 10 && r.height > 10, "{r:?}");
                    assert!(r.width % 2 == 0 && r.height % 2 == 0, "{r:?}");
                }
                None => assert_eq!(h.controller.mode_kind(), ModeKind::Selecting),
            }
        }
    }

    #[test]
    fn tiny_selection_shows_message_and_stays() {
        let mut h = harness();
        h.controller.show();
        select(&mut h.controller, (100, 100), (105, 300));

        assert_eq!(h.controller.mode_kind(), ModeKind::Selecting);
        assert_eq!(h.controller.region(), None);
        assert!(h.controller.surface().scene.texts().any(|t| t == INVALID_REGION_MESSAGE));

        h.controller.mouse_down(Point::new(0, 0));
        assert!(h.controller.surface().scene.texts().any(|t| t == SELECT_MESSAGE));
    }

    #[test]
    fn show_and_hide_from_every_mode() {
        let setups: [(&str, fn(&mut Harness)); 4] = [
            ("waiting", |_| {}),
            ("selecting", |h| h.controller.enter_selecting()),
            ("ready", |h| {
                h.controller.show();
                select(&mut h.controller, (10, 10), (210, 160));
            }),
            ("recording", |h| {
                h.controller.show();
                select(&mut h.controller, (10, 10), (210, 160));
                h.controller.toggle_recording();
            }),
        ];

        for (name, setup) in setups {
            let mut h = harness();
            setup(&mut h);
            let had_region = h.controller.region().is_some();

            h.controller.show();
            let expected = if had_region { ModeKind::Ready } else { ModeKind::Selecting };
            assert_eq!(h.controller.mode_kind(), expected, "show from {name}");

            h.controller.hide();
            assert_eq!(h.controller.mode_kind(), ModeKind::Waiting, "hide from {name}");
            assert!(!h.controller.is_recording(), "hide from {name}");
        }
    }

    #[test]
    fn saved_region_that_no_longer_fits_is_not_restored() {
        for saved in [
            CaptureRegion::new(1900, 1070, 15, 3),
            CaptureRegion::new(1800, 900, 200, 100),
            CaptureRegion::new(10, 10, 101, 100),
            CaptureRegion::new(-4, 0, 100, 100),
        ] {
            let mut h = harness_with(FakeRecorder::default(), Some(saved));
            assert_eq!(h.controller.region(), None, "{saved:?}");

            h.controller.show();
            assert_eq!(h.controller.mode_kind(), ModeKind::Selecting, "{saved:?}");
        }
    }

    #[test]
    fn saved_region_on_screen_is_restored() {
        let saved = CaptureRegion::new(1820, 980, 100, 100);
        let mut h = harness_with(FakeRecorder::default(), Some(saved));
        assert_eq!(h.controller.region(), Some(saved));

        h.controller.show();
        assert_eq!(h.controller.mode_kind(), ModeKind::Ready);
    }

    #[test]
    fn ready_drag_moves_and_persists_region() {
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller.show();
        assert_eq!(h.controller.mode_kind(), ModeKind::Ready);

        h.controller.mouse_down(Point::new(50, 50));
        h.controller.mouse_drag(Point::new(70, 80));
        assert_eq!(h.controller.region(), Some(CaptureRegion::new(20, 30, 100, 100)));
        assert_eq!(h.settings.region(), Some(CaptureRegion::new(0, 0, 100, 100)));

        h.controller.mouse_up(Point::new(70, 80));
        assert_eq!(h.settings.region(), Some(CaptureRegion::new(20, 30, 100, 100)));
    }

    #[test]
    fn ready_resize_from_corner() {
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(100, 100, 200, 150)));
        h.controller.show();

        h.controller.mouse_motion(Point::new(300, 250));
        assert_eq!(h.controller.surface().cursor, CursorHint::ResizeNWSE);

        h.controller.mouse_down(Point::new(300, 250));
        h.controller.mouse_drag(Point::new(350, 300));
        h.controller.mouse_up(Point::new(350, 300));
        assert_eq!(h.controller.region(), Some(CaptureRegion::new(100, 100, 250, 200)));
    }

    #[test]
    fn failed_start_stays_ready() {
        let recorder = FakeRecorder {
            refuse_start: true,
            ..FakeRecorder::default()
        };
        let mut h = harness_with(recorder, Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller.show();

        h.controller.toggle_recording();
        assert_eq!(h.controller.mode_kind(), ModeKind::Ready);
        assert!(!h.controller.is_recording());
        assert!(!h.controller.surface().panel_recording);
    }

    #[test]
    fn showing_during_recording_passes_clicks_through() {
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller.show();
        h.controller.toggle_recording();

        h.controller.show();
        assert_eq!(h.controller.mode_kind(), ModeKind::Ready);
        assert!(h.controller.is_recording());
        assert_eq!(h.controller.surface().pass_through, Some(true));

        h.controller.toggle_recording();
        assert_eq!(h.controller.mode_kind(), ModeKind::Recording);
    }

    #[test]
    fn edited_recording_is_handed_off_instead_of_original() {
        let handoff = FakeHandoff {
            edited: Some(Ok(PathBuf::from("edited.mp4"))),
            ..FakeHandoff::default()
        };
        let calls = handoff.calls.clone();
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller = h.controller.with_handoff(Box::new(handoff));

        h.controller.show();
        h.controller.toggle_recording();
        h.controller.toggle_recording();

        assert_eq!(
            *calls.borrow(),
            [
                "edit fake-recording.mp4".to_string(),
                "clipboard 1".to_string(),
                "preview edited.mp4".to_string()
            ]
        );
    }

    #[test]
    fn failed_edit_hands_off_original() {
        let handoff = FakeHandoff {
            edited: Some(Err("bad scale".to_string())),
            ..FakeHandoff::default()
        };
        let calls = handoff.calls.clone();
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller = h.controller.with_handoff(Box::new(handoff));

        h.controller.show();
        h.controller.toggle_recording();
        h.controller.toggle_recording();

        assert_eq!(h.controller.mode_kind(), ModeKind::Waiting);
        assert_eq!(
            *calls.borrow(),
            ["clipboard 1".to_string(), "preview fake-recording.mp4".to_string()]
        );
    }

    #[test]
    fn finished_recording_is_handed_off() {
        let handoff = FakeHandoff::default();
        let calls = handoff.calls.clone();
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller = h.controller.with_handoff(Box::new(handoff));

        h.controller.show();
        h.controller.toggle_recording();
        h.controller.toggle_recording();

        assert_eq!(
            *calls.borrow(),
            ["clipboard 1".to_string(), "preview fake-recording.mp4".to_string()]
        );
    }

    #[test]
    fn handoff_failures_are_swallowed() {
        let handoff = FakeHandoff {
            fail: true,
            ..FakeHandoff::default()
        };
        let calls = handoff.calls.clone();
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller = h.controller.with_handoff(Box::new(handoff));

        h.controller.show();
        h.controller.toggle_recording();
        h.controller.toggle_recording();

        assert_eq!(h.controller.mode_kind(), ModeKind::Waiting);
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn hide_stops_without_handoff() {
        let handoff = FakeHandoff::default();
        let calls = handoff.calls.clone();
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller = h.controller.with_handoff(Box::new(handoff));

        h.controller.show();
        h.controller.toggle_recording();
        h.controller.handle_event(SurfaceEvent::Escape);

        assert_eq!(h.controller.mode_kind(), ModeKind::Waiting);
        assert_eq!(h.recorder.lock().stops, 1);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn os_failures_do_not_block_transitions() {
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller.surface_mut().fail_os_calls = true;

        h.controller.show();
        h.controller.reassert_stacking();
        h.controller.toggle_recording();
        assert_eq!(h.controller.mode_kind(), ModeKind::Recording);
    }

    #[test]
    fn stacking_only_reasserted_in_ready() {
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller.reassert_stacking();
        assert_eq!(h.controller.surface().raises, 0);

        h.controller.show();
        let before = h.controller.surface().raises;
        h.controller.reassert_stacking();
        assert_eq!(h.controller.surface().raises, before + 1);

        h.controller.toggle_recording();
        let before = h.controller.surface().raises;
        h.controller.reassert_stacking();
        assert_eq!(h.controller.surface().raises, before);
    }

    #[test]
    fn panel_buttons_drive_modes() {
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller.show();

        click_button(&mut h.controller, ControlButton::Record);
        assert_eq!(h.controller.mode_kind(), ModeKind::Recording);

        click_button(&mut h.controller, ControlButton::Close);
        assert_eq!(h.controller.mode_kind(), ModeKind::Recording);

        click_button(&mut h.controller, ControlButton::Record);
        assert_eq!(h.controller.mode_kind(), ModeKind::Waiting);

        h.controller.show();
        click_button(&mut h.controller, ControlButton::SelectRegion);
        assert_eq!(h.controller.mode_kind(), ModeKind::Selecting);
        assert!(!h.controller.surface().panel_visible);
    }

    #[test]
    fn panel_drag_persists_position() {
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        h.controller.show();

        let (ox, oy) = h.controller.controls().origin(SCREEN);
        let grip = ControlsPanel::grip_rect();
        let start = Point::new(ox + grip.left + 1, oy + grip.top + 1);

        h.controller.handle_event(SurfaceEvent::PanelDown(start));
        h.controller.handle_event(SurfaceEvent::PanelDrag(Point::new(start.x - 100, start.y - 50)));
        h.controller.handle_event(SurfaceEvent::PanelUp(Point::new(start.x - 100, start.y - 50)));

        assert_eq!(h.settings.panel_position(), Some((ox - 100, oy - 50)));
        assert_eq!(h.controller.surface().panel_origin, (ox - 100, oy - 50));
    }

    #[test]
    fn queued_commands_run_in_order() {
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(0, 0, 100, 100)));
        let tx = h.controller.command_sender();
        tx.send(OverlayCommand::Show).expect("send");
        tx.send(OverlayCommand::ToggleRecording).expect("send");

        assert_eq!(h.controller.drain_commands(), 2);
        assert_eq!(h.controller.mode_kind(), ModeKind::Recording);

        tx.send(OverlayCommand::Hide).expect("send");
        assert_eq!(h.controller.drain_commands(), 1);
        assert_eq!(h.controller.mode_kind(), ModeKind::Waiting);
        assert_eq!(h.controller.drain_commands(), 0);
    }

    #[test]
    fn recording_scene_punches_hole_for_region() {
        let mut h = harness_with(FakeRecorder::default(), Some(CaptureRegion::new(100, 100, 200, 150)));
        h.controller.show();
        h.controller.toggle_recording();

        let has_key_fill = h.controller.surface().scene.commands().iter().any(|c| {
            matches!(c, crate::scene::DrawCommand::FillRect { color, .. } if *color == crate::scene::Color::TRANSPARENT_KEY)
        });
        assert!(has_key_fill);
    }
}
