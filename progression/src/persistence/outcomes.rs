//! Results of repository workflows that can end in more than one way.

use puzzle::{
    DailyReward, DailyRewardClaim, DailyRewardStats, LevelGameState, PlayerProgress,
    UnlockShortfall,
};

#[derive(Debug, Clone, PartialEq)]
pub enum UnlockOutcome {
    Unlocked { progress: PlayerProgress },
    AlreadyUnlocked,
    Insufficient(UnlockShortfall),
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HintOutcome {
    /// Tiles were hidden and the hint was paid for.
    Applied {
        removed: Vec<usize>,
        state: LevelGameState,
        coins_left: i64,
    },
    InsufficientCoins {
        required: i64,
        available: i64,
    },
    /// Every remaining tile belongs to the answer. Nothing was charged.
    NothingToRemove,
    LevelNotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefillOutcome {
    Refilled(LevelGameState),
    InsufficientCoins { required: i64, available: i64 },
    LevelNotFound,
}

/// Everything credited when a level is solved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCompletion {
    pub level_id: i64,
    pub stars_earned: u32,
    pub coins_earned: i64,
    pub completion_time: i64,
    /// The following level by number, now unlocked.
    pub next_level_id: Option<i64>,
    /// No hint used and no life lost on the stored attempt.
    pub perfect: bool,
    pub category_completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRewardStatus {
    pub can_claim: bool,
    /// Position in the seven-day cycle of the reward on offer.
    pub cycle_day: u32,
    pub reward: Option<DailyReward>,
    pub stats: DailyRewardStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyClaimReceipt {
    pub claim: DailyRewardClaim,
    pub reward: DailyReward,
    pub stats: DailyRewardStats,
    pub progress: PlayerProgress,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed(DailyClaimReceipt),
    AlreadyClaimed,
    /// The catalog has no active reward for this cycle day.
    NoRewardForDay(u32),
}
