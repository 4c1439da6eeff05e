//! Data-access objects, one per table.
//!
//! Every method takes `&mut SqliteConnection` so the same call works on a
//! pooled connection or inside a transaction.

mod category;
mod category_stats;
mod daily_reward;
mod daily_reward_claim;
mod daily_reward_stats;
mod level;
mod level_state;
mod player_progress;

pub use category::CategoryDao;
pub use category_stats::CategoryStatsDao;
pub use daily_reward::DailyRewardDao;
pub use daily_reward_claim::DailyRewardClaimDao;
pub use daily_reward_stats::DailyRewardStatsDao;
pub use level::LevelDao;
pub use level_state::LevelStateDao;
pub use player_progress::PlayerProgressDao;
