//! Runtime configuration.
//!
//! Data directory precedence:
//! 1. `WORDQUEST_DATA_DIR` environment variable
//! 2. the platform data directory (e.g. `~/.local/share/wordquest`)
//! 3. `./data` as a development fallback
//!
//! Gameplay tunables come from [`GameConfig`], whose defaults can be
//! overridden with `WORDQUEST_*` environment variables.

use std::path::PathBuf;

use directories::ProjectDirs;
use puzzle::{LivesPolicy, RegenerationMode};
use tracing::warn;

const DEV_DATA_DIR: &str = "./data";
const DATABASE_FILE: &str = "wordquest.db";
const SETTINGS_FILE: &str = "settings.json";

pub const DATA_DIR_ENV: &str = "WORDQUEST_DATA_DIR";
pub const LIVES_REGEN_SECS_ENV: &str = "WORDQUEST_LIVES_REGEN_SECS";
pub const LIVES_MODE_ENV: &str = "WORDQUEST_LIVES_MODE";

/// Coins charged to refill lives after a game over.
pub const DEFAULT_REFILL_COST: i64 = 50;
/// Minimum gap between two interstitial ads.
pub const DEFAULT_INTERSTITIAL_COOLDOWN_SECS: i64 = 180;
/// Minimum gap between two rewarded ads.
pub const DEFAULT_REWARDED_COOLDOWN_SECS: i64 = 30;
/// Completed levels before the app asks for a rating.
pub const DEFAULT_RATING_PROMPT_THRESHOLD: i64 = 10;

pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(dirs) = ProjectDirs::from("", "", "wordquest") {
        return dirs.data_dir().to_path_buf();
    }

    PathBuf::from(DEV_DATA_DIR)
}

pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}

pub fn settings_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub lives: LivesPolicy,
    pub refill_cost: i64,
    pub interstitial_cooldown_secs: i64,
    pub rewarded_cooldown_secs: i64,
    pub rating_prompt_threshold: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            lives: LivesPolicy::default(),
            refill_cost: DEFAULT_REFILL_COST,
            interstitial_cooldown_secs: DEFAULT_INTERSTITIAL_COOLDOWN_SECS,
            rewarded_cooldown_secs: DEFAULT_REWARDED_COOLDOWN_SECS,
            rating_prompt_threshold: DEFAULT_RATING_PROMPT_THRESHOLD,
        }
    }
}

impl GameConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup. Unparseable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(LIVES_REGEN_SECS_ENV) {
            match raw.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => self.lives.interval_secs = secs,
                _ => warn!(value = %raw, "Ignoring invalid {LIVES_REGEN_SECS_ENV}"),
            }
        }
        if let Some(raw) = lookup(LIVES_MODE_ENV) {
            match RegenerationMode::parse(raw.trim()) {
                Some(mode) => self.lives.mode = mode,
                None => warn!(value = %raw, "Ignoring invalid {LIVES_MODE_ENV}"),
            }
        }
        self
    }
}
