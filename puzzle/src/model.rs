//! Entity types persisted by the progression store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryType, RewardType};

/// Id of the singleton `PlayerProgress` and `DailyRewardStats` rows.
pub const SINGLETON_ID: i64 = 1;

/// Id of the starter category, unlocked from the first launch.
pub const STARTER_CATEGORY_ID: i64 = 1;

pub const DEFAULT_MAX_LIVES: u32 = 3;
pub const DEFAULT_HINT_COST: i64 = 10;
pub const DEFAULT_STARS_REWARD: u32 = 3;
pub const DEFAULT_COINS_REWARD: i64 = 5;
pub const STARTING_COINS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub category_type: CategoryType,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub required_stars: i64,
    pub required_coins: i64,
    pub required_vip_points: i64,
    pub is_vip_category: bool,
    pub is_daily_category: bool,
    pub is_unlocked: bool,
    pub sort_order: i64,
    /// Read from the category stats cache.
    pub total_levels: u32,
    /// Read from the category stats cache.
    pub completed_levels: u32,
}

impl Category {
    /// Share of completed levels, 0..=100.
    pub fn completion_percent(&self) -> u8 {
        if self.total_levels == 0 {
            return 0;
        }
        let pct = (self.completed_levels.min(self.total_levels) * 100) / self.total_levels;
        pct as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: i64,
    pub category_id: i64,
    pub level_number: u32,
    pub question: String,
    pub image: Option<String>,
    pub answer: String,
    /// Ordered tile pool the player picks from. Tiles are addressed by index.
    pub available_letters: Vec<char>,
    pub answer_length: u32,
    pub max_lives: u32,
    pub hint_cost: i64,
    pub stars_reward: u32,
    pub coins_reward: i64,
    pub is_unlocked: bool,
    pub is_completed: bool,
    pub stars_earned: u32,
    /// Seconds taken on the best completed attempt.
    pub completion_time: Option<i64>,
}

impl Level {
    /// The answer lowercased with whitespace dropped, as compared against input.
    pub fn normalized_answer(&self) -> String {
        normalize_answer(&self.answer)
    }

    /// Whether `letter` appears anywhere in the answer, ignoring case.
    pub fn answer_contains(&self, letter: char) -> bool {
        let answer = self.normalized_answer();
        letter.to_lowercase().all(|l| answer.contains(l))
    }

    pub fn letter(&self, tile: usize) -> Option<char> {
        self.available_letters.get(tile).copied()
    }
}

/// Lowercase and strip whitespace so answers compare independent of spacing.
pub fn normalize_answer(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub id: i64,
    pub total_stars: i64,
    pub total_coins: i64,
    pub vip_points: i64,
    pub current_level_id: Option<i64>,
    pub total_completed_levels: i64,
    /// Seconds.
    pub total_play_time: i64,
    pub hints_used: i64,
    pub perfect_levels: i64,
    pub last_played: Option<i64>,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self {
            id: SINGLETON_ID,
            total_stars: 0,
            total_coins: STARTING_COINS,
            vip_points: 0,
            current_level_id: None,
            total_completed_levels: 0,
            total_play_time: 0,
            hints_used: 0,
            perfect_levels: 0,
            last_played: None,
        }
    }
}

/// Session state of one in-progress level attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelGameState {
    pub level_id: i64,
    pub current_lives: u32,
    /// Selected tiles in selection order.
    pub used_tiles: Vec<usize>,
    /// Tiles hidden by hints, in removal order.
    pub removed_tiles: Vec<usize>,
    pub hints_used_count: u32,
    /// Unix millis, shifted forward by every pause.
    pub start_time: i64,
    pub pause_time: Option<i64>,
    pub is_paused: bool,
    /// When the lives regeneration timer started, if one is running.
    pub lives_depleted_at: Option<i64>,
}

impl LevelGameState {
    pub fn fresh(level: &Level, now: i64) -> Self {
        Self {
            level_id: level.id,
            current_lives: level.max_lives,
            used_tiles: Vec::new(),
            removed_tiles: Vec::new(),
            hints_used_count: 0,
            start_time: now,
            pause_time: None,
            is_paused: false,
            lives_depleted_at: None,
        }
    }

    /// The partial answer spelled by the selected tiles.
    pub fn player_answer(&self, level: &Level) -> String {
        self.used_tiles
            .iter()
            .filter_map(|&tile| level.letter(tile))
            .collect()
    }

    pub fn is_used(&self, tile: usize) -> bool {
        self.used_tiles.contains(&tile)
    }

    pub fn is_removed(&self, tile: usize) -> bool {
        self.removed_tiles.contains(&tile)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category_id: i64,
    pub completed_levels: u32,
    pub total_levels: u32,
    pub stars_earned: i64,
    pub best_time: Option<i64>,
    pub last_played_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReward {
    pub id: i64,
    /// Position in the cycle, 1..=7.
    pub day: u32,
    pub reward_type: RewardType,
    pub amount: i64,
    pub icon: String,
    pub is_special_reward: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRewardClaim {
    pub id: i64,
    pub reward_id: i64,
    pub claim_date: NaiveDate,
    pub day_streak: u32,
    pub claimed_amount: i64,
    pub bonus_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRewardStats {
    pub id: i64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_claims: i64,
    pub last_claim_date: Option<NaiveDate>,
    pub next_reset_date: Option<NaiveDate>,
    pub total_coins_earned: i64,
    pub total_stars_earned: i64,
    pub total_vip_points_earned: i64,
    pub missed_days: i64,
}

impl Default for DailyRewardStats {
    fn default() -> Self {
        Self {
            id: SINGLETON_ID,
            current_streak: 0,
            longest_streak: 0,
            total_claims: 0,
            last_claim_date: None,
            next_reset_date: None,
            total_coins_earned: 0,
            total_stars_earned: 0,
            total_vip_points_earned: 0,
            missed_days: 0,
        }
    }
}
