//! Persistence layer: SQLite schema, one DAO per entity, and the repository
//! façades that group DAO calls into atomic game operations.

pub mod outcomes;
pub mod sqlite;
pub mod traits;

pub use outcomes::{
    ClaimOutcome, DailyClaimReceipt, DailyRewardStatus, HintOutcome, LevelCompletion,
    RefillOutcome, UnlockOutcome,
};
pub use traits::{DailyRewardRepository, GameRepository};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}
