//! Async repository trait definitions for the persistence layer.
//!
//! View-models are generic over these traits so tests can drive them with the
//! in-memory SQLite backend. Methods return `impl Future + Send` rather than
//! using `async fn` so the futures can cross `tokio::spawn`.
//!
//! Every method that writes more than one row commits atomically.

use std::future::Future;

use chrono::NaiveDate;
use puzzle::{
    Category, CategoryStats, Currency, DailyReward, DailyRewardClaim, DailyRewardStats, HintKind,
    Level, LevelGameState, PlayerProgress,
};

use super::outcomes::{
    ClaimOutcome, DailyRewardStatus, HintOutcome, LevelCompletion, RefillOutcome, UnlockOutcome,
};
use super::PersistenceError;

/// Categories, levels, the player's wallet and in-progress level state.
pub trait GameRepository: Send + Sync {
    /// All categories in display order.
    fn categories(&self)
        -> impl Future<Output = Result<Vec<Category>, PersistenceError>> + Send;
    fn category(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Category>, PersistenceError>> + Send;
    fn levels(
        &self,
        category_id: i64,
    ) -> impl Future<Output = Result<Vec<Level>, PersistenceError>> + Send;
    fn level(&self, id: i64) -> impl Future<Output = Result<Option<Level>, PersistenceError>> + Send;
    /// The level after `level_id` in the same category, by level number.
    fn next_level(
        &self,
        level_id: i64,
    ) -> impl Future<Output = Result<Option<Level>, PersistenceError>> + Send;
    fn progress(&self) -> impl Future<Output = Result<PlayerProgress, PersistenceError>> + Send;
    fn category_stats(
        &self,
        category_id: i64,
    ) -> impl Future<Output = Result<Option<CategoryStats>, PersistenceError>> + Send;
    fn level_state(
        &self,
        level_id: i64,
    ) -> impl Future<Output = Result<Option<LevelGameState>, PersistenceError>> + Send;

    /// Check the category's requirement and, if met, unlock it and deduct
    /// its cost together.
    fn unlock_category(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<UnlockOutcome, PersistenceError>> + Send;

    /// Load or create the level's state and mark it as the current level.
    /// `None` when the level does not exist.
    fn start_level(
        &self,
        level_id: i64,
        now: i64,
    ) -> impl Future<Output = Result<Option<(Level, LevelGameState)>, PersistenceError>> + Send;
    fn save_level_state(
        &self,
        state: &LevelGameState,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Replace the level's state with a fresh one.
    fn restart_level(
        &self,
        level_id: i64,
        now: i64,
    ) -> impl Future<Output = Result<Option<LevelGameState>, PersistenceError>> + Send;

    /// Mark solved, credit rewards, refresh category stats, clear the level
    /// state and unlock the next level. `None` when the level does not exist.
    fn complete_level(
        &self,
        level_id: i64,
        stars_earned: u32,
        completion_time_secs: i64,
        now: i64,
    ) -> impl Future<Output = Result<Option<LevelCompletion>, PersistenceError>> + Send;

    fn use_hint(
        &self,
        level_id: i64,
        kind: HintKind,
        now: i64,
    ) -> impl Future<Output = Result<HintOutcome, PersistenceError>> + Send;

    /// Buy a full set of lives for `cost` coins. A zero cost always succeeds.
    fn refill_lives(
        &self,
        level_id: i64,
        cost: i64,
    ) -> impl Future<Output = Result<RefillOutcome, PersistenceError>> + Send;

    /// Credit a reward earned outside play, such as a rewarded ad.
    fn grant_reward(
        &self,
        currency: Currency,
        amount: i64,
    ) -> impl Future<Output = Result<PlayerProgress, PersistenceError>> + Send;
}

/// The seven-day login reward cycle.
pub trait DailyRewardRepository: Send + Sync {
    fn rewards(&self)
        -> impl Future<Output = Result<Vec<DailyReward>, PersistenceError>> + Send;
    /// Claim history, newest first.
    fn claims(&self)
        -> impl Future<Output = Result<Vec<DailyRewardClaim>, PersistenceError>> + Send;
    fn stats(&self) -> impl Future<Output = Result<DailyRewardStats, PersistenceError>> + Send;
    /// Re-evaluates the streak against `today` before reporting.
    fn status(
        &self,
        today: NaiveDate,
    ) -> impl Future<Output = Result<DailyRewardStatus, PersistenceError>> + Send;
    fn claim(
        &self,
        today: NaiveDate,
        multiplier: f64,
    ) -> impl Future<Output = Result<ClaimOutcome, PersistenceError>> + Send;
}
