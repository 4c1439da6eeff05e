//! Key-value settings store backed by a single JSON file.
//!
//! Every mutation is written through to disk. Values keep the runtime type of
//! the JSON they were read from: booleans, integers, floats, strings and sets
//! of strings.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::persistence::PersistenceError;

pub const KEY_SOUND: &str = "sound_enabled";
pub const KEY_MUSIC: &str = "music_enabled";
pub const KEY_VIBRATION: &str = "vibration_enabled";
pub const KEY_NOTIFICATIONS: &str = "notifications_enabled";
pub const KEY_LANGUAGE: &str = "language";
pub const KEY_FIRST_LAUNCH: &str = "first_launch";
pub const KEY_TUTORIAL_COMPLETED: &str = "tutorial_completed";
pub const KEY_LAST_INTERSTITIAL_AD: &str = "last_interstitial_ad";
pub const KEY_LAST_REWARDED_AD: &str = "last_rewarded_ad";
pub const KEY_LEVELS_SINCE_RATING_PROMPT: &str = "levels_since_rating_prompt";
pub const KEY_RATING_PROMPT_SHOWN: &str = "rating_prompt_shown";

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextSet(BTreeSet<String>),
}

impl SettingValue {
    /// Type a JSON value by its runtime shape. `None` for null, objects and
    /// arrays holding anything but strings.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<BTreeSet<_>>>()
                .map(Self::TextSet),
            Value::Null | Value::Object(_) => None,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    values: BTreeMap<String, SettingValue>,
}

impl SettingsStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            parse_values(&contents)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = values.len(), "Settings loaded");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    // ── Generic access ─────────────────────────────────────────────────

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: SettingValue) -> Result<(), PersistenceError> {
        self.values.insert(key.to_string(), value);
        self.persist()
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<SettingValue>, PersistenceError> {
        let removed = self.values.remove(key);
        self.persist()?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.values.clear();
        self.persist()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(SettingValue::Bool(b)) => *b,
            _ => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(SettingValue::Int(n)) => *n,
            _ => default,
        }
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(SettingValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PersistenceError> {
        self.set(key, SettingValue::Bool(value))
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), PersistenceError> {
        self.set(key, SettingValue::Int(value))
    }

    // ── Preferences ────────────────────────────────────────────────────

    pub fn sound_enabled(&self) -> bool {
        self.get_bool(KEY_SOUND, true)
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) -> Result<(), PersistenceError> {
        self.set_bool(KEY_SOUND, enabled)
    }

    pub fn music_enabled(&self) -> bool {
        self.get_bool(KEY_MUSIC, true)
    }

    pub fn set_music_enabled(&mut self, enabled: bool) -> Result<(), PersistenceError> {
        self.set_bool(KEY_MUSIC, enabled)
    }

    pub fn vibration_enabled(&self) -> bool {
        self.get_bool(KEY_VIBRATION, true)
    }

    pub fn set_vibration_enabled(&mut self, enabled: bool) -> Result<(), PersistenceError> {
        self.set_bool(KEY_VIBRATION, enabled)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.get_bool(KEY_NOTIFICATIONS, true)
    }

    pub fn set_notifications_enabled(&mut self, enabled: bool) -> Result<(), PersistenceError> {
        self.set_bool(KEY_NOTIFICATIONS, enabled)
    }

    pub fn language(&self) -> &str {
        self.get_text(KEY_LANGUAGE).unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn set_language(&mut self, code: &str) -> Result<(), PersistenceError> {
        self.set(KEY_LANGUAGE, SettingValue::Text(code.to_string()))
    }

    // ── Onboarding ─────────────────────────────────────────────────────

    pub fn is_first_launch(&self) -> bool {
        self.get_bool(KEY_FIRST_LAUNCH, true)
    }

    pub fn mark_launched(&mut self) -> Result<(), PersistenceError> {
        self.set_bool(KEY_FIRST_LAUNCH, false)
    }

    pub fn tutorial_completed(&self) -> bool {
        self.get_bool(KEY_TUTORIAL_COMPLETED, false)
    }

    pub fn mark_tutorial_completed(&mut self) -> Result<(), PersistenceError> {
        self.set_bool(KEY_TUTORIAL_COMPLETED, true)
    }

    // ── Ad pacing ──────────────────────────────────────────────────────

    pub fn record_interstitial_ad(&mut self, now: i64) -> Result<(), PersistenceError> {
        self.set_int(KEY_LAST_INTERSTITIAL_AD, now)
    }

    pub fn can_show_interstitial(&self, now: i64, cooldown_secs: i64) -> bool {
        cooldown_elapsed(self.get_int(KEY_LAST_INTERSTITIAL_AD, 0), now, cooldown_secs)
    }

    pub fn record_rewarded_ad(&mut self, now: i64) -> Result<(), PersistenceError> {
        self.set_int(KEY_LAST_REWARDED_AD, now)
    }

    pub fn can_show_rewarded(&self, now: i64, cooldown_secs: i64) -> bool {
        cooldown_elapsed(self.get_int(KEY_LAST_REWARDED_AD, 0), now, cooldown_secs)
    }

    // ── Rating prompt ──────────────────────────────────────────────────

    pub fn levels_since_rating_prompt(&self) -> i64 {
        self.get_int(KEY_LEVELS_SINCE_RATING_PROMPT, 0)
    }

    pub fn record_level_completed(&mut self) -> Result<(), PersistenceError> {
        let count = self.levels_since_rating_prompt() + 1;
        self.set_int(KEY_LEVELS_SINCE_RATING_PROMPT, count)
    }

    pub fn rating_prompt_shown(&self) -> bool {
        self.get_bool(KEY_RATING_PROMPT_SHOWN, false)
    }

    pub fn mark_rating_prompt_shown(&mut self) -> Result<(), PersistenceError> {
        self.values
            .insert(KEY_RATING_PROMPT_SHOWN.to_string(), SettingValue::Bool(true));
        self.values
            .insert(KEY_LEVELS_SINCE_RATING_PROMPT.to_string(), SettingValue::Int(0));
        self.persist()
    }

    pub fn should_prompt_rating(&self, threshold: i64) -> bool {
        !self.rating_prompt_shown() && self.levels_since_rating_prompt() >= threshold
    }

    // ── Export / import ────────────────────────────────────────────────

    pub fn export_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(&self.values)?)
    }

    /// Replace every setting with those in `json`. The input is parsed in
    /// full before anything is cleared, so a malformed document leaves the
    /// store untouched. Returns the number of keys imported.
    pub fn import_json(&mut self, json: &str) -> Result<usize, PersistenceError> {
        let values = parse_values(json)?;
        self.values = values;
        self.persist()?;
        Ok(self.values.len())
    }
}

fn cooldown_elapsed(last: i64, now: i64, cooldown_secs: i64) -> bool {
    last == 0 || now - last >= cooldown_secs * 1000
}

fn parse_values(json: &str) -> Result<BTreeMap<String, SettingValue>, PersistenceError> {
    let raw: serde_json::Map<String, Value> = serde_json::from_str(json)?;
    let mut values = BTreeMap::new();
    for (key, value) in raw {
        match SettingValue::from_json(&value) {
            Some(typed) => {
                values.insert(key, typed);
            }
            None => warn!(%key, "Skipping setting with unsupported value"),
        }
    }
    Ok(values)
}
