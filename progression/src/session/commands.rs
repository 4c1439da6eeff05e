use puzzle::{AttemptError, HintKind};
use tokio::sync::{broadcast, oneshot};

use super::events::LevelEvent;
use super::snapshot::LevelSnapshot;
use crate::persistence::PersistenceError;
use crate::rewards::AdOutcome;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Level {0} not found")]
    LevelNotFound(i64),
    #[error("Level {0} is locked")]
    LevelLocked(i64),
    #[error("Category {0} is locked")]
    CategoryLocked(i64),
    #[error(transparent)]
    Rejected(#[from] AttemptError),
    #[error("Not enough coins: need {required}, have {available}")]
    InsufficientCoins { required: i64, available: i64 },
    #[error("No incorrect letters left to remove")]
    NothingToRemove,
    #[error("Storage error: {0}")]
    Persistence(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PersistenceError> for SessionError {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e.to_string())
    }
}

pub type SnapshotReply = oneshot::Sender<Result<LevelSnapshot, SessionError>>;

/// Commands sent to the level session actor. Each embeds a oneshot for the reply.
pub enum LevelCommand {
    SelectTile { tile: usize, reply: SnapshotReply },
    DeleteLast { reply: SnapshotReply },
    ClearAll { reply: SnapshotReply },
    UseHint { kind: HintKind, reply: SnapshotReply },
    Pause { reply: SnapshotReply },
    Resume { reply: SnapshotReply },
    Restart { reply: SnapshotReply },
    /// Buy lives at the configured price.
    RefillLives { reply: SnapshotReply },
    AdResult { outcome: AdOutcome, reply: SnapshotReply },
    GetSnapshot {
        reply: oneshot::Sender<LevelSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<(LevelSnapshot, broadcast::Receiver<LevelEvent>)>,
    },
    Shutdown,
}
