//! Settings module for ScreenRecorder
//!
//! Persists the capture region and the controls panel position as JSON.
//! Reads never fail: a missing or unreadable file yields empty settings.

use capture::{CaptureRegion, EditPlan};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

const APP_DIR: &str = "screenrecorder";
const FILE_NAME: &str = "config.json";

/// Contents of the settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "region_as_array",
        deserialize_with = "lenient_region"
    )]
    pub capture_region: Option<CaptureRegion>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_position"
    )]
    pub main_panel_position: Option<(i32, i32)>,

    /// Edits applied to every finished recording
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_edit_plan"
    )]
    pub post_edit: Option<EditPlan>,

    /// Keys this version does not know about, kept on rewrite
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn region_as_array<S: Serializer>(region: &Option<CaptureRegion>, s: S) -> Result<S::Ok, S::Error> {
    match region {
        Some(r) => [r.x as i64, r.y as i64, r.width as i64, r.height as i64].serialize(s),
        None => s.serialize_none(),
    }
}

fn lenient_region<'de, D: Deserializer<'de>>(d: D) -> Result<Option<CaptureRegion>, D::Error> {
    let value = Value::deserialize(d)?;
    if value.is_null() {
        return Ok(None);
    }
    let Some([x, y, w, h]) = int_array::<4>(&value) else {
        warn!("Ignoring malformed capture_region: {}", value);
        return Ok(None);
    };

    let region = (|| {
        let width = u32::try_from(w).ok().filter(|w| *w > 0)?;
        let height = u32::try_from(h).ok().filter(|h| *h > 0)?;
        Some(CaptureRegion::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?, width, height))
    })();
    if region.is_none() {
        warn!("Ignoring out-of-range capture_region: {}", value);
    }
    Ok(region)
}

fn lenient_position<'de, D: Deserializer<'de>>(d: D) -> Result<Option<(i32, i32)>, D::Error> {
    let value = Value::deserialize(d)?;
    let position = int_array::<2>(&value)
        .and_then(|[x, y]| Some((i32::try_from(x).ok()?, i32::try_from(y).ok()?)));
    if position.is_none() && !value.is_null() {
        warn!("Ignoring malformed main_panel_position: {}", value);
    }
    Ok(position)
}

fn lenient_edit_plan<'de, D: Deserializer<'de>>(d: D) -> Result<Option<EditPlan>, D::Error> {
    let value = Value::deserialize(d)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value.clone()) {
        Ok(plan) => Ok(Some(plan)),
        Err(e) => {
            warn!("Ignoring malformed post_edit {}: {}", value, e);
            Ok(None)
        }
    }
}

fn int_array<const N: usize>(value: &Value) -> Option<[i64; N]> {
    let items = value.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut out = [0i64; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_i64()?;
    }
    Some(out)
}

/// Handle to a settings file
///
/// Each accessor re-reads the file so writes from other keys are never lost.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/screenrecorder/config.json`, or `./config.json` when the
    /// platform has no config directory.
    pub fn default_location() -> Self {
        let path = dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(FILE_NAME));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to empty settings on any failure
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to read settings {}: {}", self.path.display(), e);
                Settings::default()
            }
        }
    }

    pub fn try_load(&self) -> SettingsResult<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Best-effort write; failures are logged
    pub fn save(&self, settings: &Settings) {
        if let Err(e) = self.try_save(settings) {
            warn!("Failed to save settings {}: {}", self.path.display(), e);
        }
    }

    pub fn try_save(&self, settings: &Settings) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        debug!("Settings written to {}", self.path.display());
        Ok(())
    }

    pub fn region(&self) -> Option<CaptureRegion> {
        self.load().capture_region
    }

    pub fn set_region(&self, region: CaptureRegion) {
        let mut settings = self.load();
        settings.capture_region = Some(region);
        self.save(&settings);
    }

    pub fn panel_position(&self) -> Option<(i32, i32)> {
        self.load().main_panel_position
    }

    /// Post-recording edits; empty plans count as none
    pub fn post_edit(&self) -> Option<EditPlan> {
        self.load().post_edit.filter(|plan| !plan.is_empty())
    }

    pub fn set_panel_position(&self, position: (i32, i32)) {
        let mut settings = self.load();
        settings.main_panel_position = Some(position);
        self.save(&settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("nested").join(FILE_NAME))
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        assert_eq!(store.load(), Settings::default());
        assert_eq!(store.region(), None);
        assert_eq!(store.panel_position(), None);
    }

    #[test]
    fn region_and_position_persist_as_arrays() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);

        store.set_region(CaptureRegion::new(10, 10, 200, 150));
        store.set_panel_position((640, 980));

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(store.path()).expect("read")).expect("json");
        assert_eq!(raw["capture_region"], serde_json::json!([10, 10, 200, 150]));
        assert_eq!(raw["main_panel_position"], serde_json::json!([640, 980]));

        assert_eq!(store.region(), Some(CaptureRegion::new(10, 10, 200, 150)));
        assert_eq!(store.panel_position(), Some((640, 980)));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        fs::write(store.path(), "{ not json").expect("write");

        assert_eq!(store.load(), Settings::default());

        store.set_panel_position((1, 2));
        assert_eq!(store.panel_position(), Some((1, 2)));
    }

    #[test]
    fn malformed_keys_are_dropped_individually() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        fs::write(
            store.path(),
            r#"{ "capture_region": [1, 2, 3], "main_panel_position": [5, 6] }"#,
        )
        .expect("write");

        let settings = store.load();
        assert_eq!(settings.capture_region, None);
        assert_eq!(settings.main_panel_position, Some((5, 6)));
    }

    #[test]
    fn non_positive_region_is_rejected() {
        let settings: Settings =
            serde_json::from_str(r#"{ "capture_region": [0, 0, 0, 40] }"#).expect("parse");
        assert_eq!(settings.capture_region, None);
    }

    #[test]
    fn unknown_keys_survive_rewrite() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        fs::write(store.path(), r#"{ "theme": "dark" }"#).expect("write");

        store.set_region(CaptureRegion::new(0, 0, 100, 100));

        let settings = store.load();
        assert_eq!(settings.extra.get("theme"), Some(&Value::from("dark")));
        assert_eq!(settings.capture_region, Some(CaptureRegion::new(0, 0, 100, 100)));
    }

    #[test]
    fn post_edit_plan_is_read_leniently() {
        let settings: Settings = serde_json::from_str(
            r#"{ "post_edit": { "trim_start": 1.5, "width": 640 }, "main_panel_position": [5, 6] }"#,
        )
        .expect("parse");
        let plan = settings.post_edit.expect("plan");
        assert_eq!(plan.trim_start, Some(1.5));
        assert_eq!(plan.width, Some(640));

        let settings: Settings =
            serde_json::from_str(r#"{ "post_edit": { "width": "wide" }, "main_panel_position": [5, 6] }"#)
                .expect("parse");
        assert_eq!(settings.post_edit, None);
        assert_eq!(settings.main_panel_position, Some((5, 6)));
    }

    #[test]
    fn empty_post_edit_counts_as_none() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        fs::write(store.path(), r#"{ "post_edit": {} }"#).expect("write");
        assert_eq!(store.post_edit(), None);
    }

    #[test]
    fn empty_settings_serialize_to_empty_object() {
        let json = serde_json::to_string(&Settings::default()).expect("serialize");
        assert_eq!(json, "{}");
    }
}
