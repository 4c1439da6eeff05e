pub mod attempt;
pub mod clock;
pub mod daily;
pub mod hint;
pub mod lives;
pub mod model;
pub mod rules;
pub mod types;

pub use attempt::{AnswerVerdict, AttemptError, AttemptPhase, LevelAttempt};
pub use clock::{Clock, ManualClock, SystemClock};
pub use lives::{LivesPolicy, RegenerationMode};
pub use model::{
    Category, CategoryStats, DailyReward, DailyRewardClaim, DailyRewardStats, Level,
    LevelGameState, PlayerProgress,
};
pub use rules::{UnlockCost, UnlockShortfall};
pub use types::{CategoryType, Currency, HintKind, RewardType};
