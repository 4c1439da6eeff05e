//! Level session view-model.
//!
//! Each opened level runs as an actor task that owns a [`puzzle::LevelAttempt`]
//! and persists it after every mutation. Callers talk to it through a
//! [`LevelSessionHandle`]; every state change is broadcast as a
//! [`LevelEvent::StateChanged`] snapshot.

pub mod actor;
pub mod commands;
pub mod events;
pub mod handle;
pub mod snapshot;
pub mod state;

use std::sync::Arc;

use puzzle::rules::is_level_playable;
use puzzle::{Clock, LevelAttempt};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::persistence::GameRepository;
use actor::run_level_actor;
pub use commands::SessionError;
pub use events::LevelEvent;
pub use handle::LevelSessionHandle;
pub use snapshot::{LevelSnapshot, TileView};
use state::LevelSessionState;

/// Open a level and spawn its session actor. Pending regeneration time is
/// applied before the first snapshot.
pub async fn spawn_level_session<R: GameRepository + 'static>(
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    config: GameConfig,
    level_id: i64,
) -> Result<LevelSessionHandle, SessionError> {
    let level = repo
        .level(level_id)
        .await?
        .ok_or(SessionError::LevelNotFound(level_id))?;
    let category = repo
        .category(level.category_id)
        .await?
        .ok_or(SessionError::LevelNotFound(level_id))?;
    if !category.is_unlocked {
        return Err(SessionError::CategoryLocked(category.id));
    }
    if !is_level_playable(&category, &level) {
        return Err(SessionError::LevelLocked(level_id));
    }

    let now = clock.now_millis();
    let (level, game_state) = repo
        .start_level(level_id, now)
        .await?
        .ok_or(SessionError::LevelNotFound(level_id))?;

    let mut attempt = LevelAttempt::new(level, game_state);
    if attempt.regenerate_lives(now, &config.lives) {
        repo.save_level_state(attempt.state()).await?;
    }

    let session_id = Uuid::new_v4().to_string();
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, _) = broadcast::channel(100);

    let state = LevelSessionState::new(session_id.clone(), attempt, repo, clock, config);
    tokio::spawn(async move {
        run_level_actor(state, cmd_rx, event_tx).await;
    });

    Ok(LevelSessionHandle::new(session_id, cmd_tx))
}
