//! Letter-selection and answer-checking state machine for a single level attempt.
//!
//! ```text
//! InProgress ──full answer, match──────▶ Solved
//!     │  ▲
//!     │  └──full answer, mismatch, lives left (answer cleared)
//!     └──full answer, mismatch, no lives───▶ GameOver ──regen / refill──▶ InProgress
//! ```
//!
//! Pausing is orthogonal to the phase: a paused attempt rejects input until resumed.

use crate::lives::LivesPolicy;
use crate::model::{normalize_answer, Level, LevelGameState};
use crate::rules::{calculate_stars_earned, lives_lost};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error("Tile {0} does not exist")]
    TileOutOfRange(usize),
    #[error("Tile {0} is already selected")]
    TileAlreadyUsed(usize),
    #[error("Tile {0} was removed by a hint")]
    TileRemoved(usize),
    #[error("Answer is already complete")]
    AnswerFull,
    #[error("Level is paused")]
    Paused,
    #[error("Level is not paused")]
    NotPaused,
    #[error("No lives left")]
    NoLivesLeft,
    #[error("Level is already solved")]
    AlreadySolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    InProgress,
    Solved,
    GameOver,
}

/// Result of checking a complete answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerVerdict {
    Correct {
        stars_earned: u32,
        completion_time_secs: i64,
    },
    Wrong {
        lives_left: u32,
    },
    GameOver,
}

/// One attempt at a level: the immutable puzzle plus its mutable session state.
#[derive(Debug, Clone)]
pub struct LevelAttempt {
    level: Level,
    state: LevelGameState,
    solved_at: Option<i64>,
}

impl LevelAttempt {
    pub fn new(level: Level, state: LevelGameState) -> Self {
        Self {
            level,
            state,
            solved_at: None,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn state(&self) -> &LevelGameState {
        &self.state
    }

    pub fn phase(&self) -> AttemptPhase {
        if self.solved_at.is_some() {
            AttemptPhase::Solved
        } else if self.state.current_lives == 0 {
            AttemptPhase::GameOver
        } else {
            AttemptPhase::InProgress
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused
    }

    pub fn player_answer(&self) -> String {
        self.state.player_answer(&self.level)
    }

    pub fn lives_lost(&self) -> u32 {
        lives_lost(&self.level, self.state.current_lives)
    }

    /// Stars this attempt would earn if solved now.
    pub fn stars_earned(&self) -> u32 {
        calculate_stars_earned(
            self.level.stars_reward,
            self.state.hints_used_count,
            self.lives_lost(),
        )
    }

    /// Tiles that may still be selected.
    pub fn selectable_tiles(&self) -> Vec<usize> {
        (0..self.level.available_letters.len())
            .filter(|&tile| !self.state.is_used(tile) && !self.state.is_removed(tile))
            .collect()
    }

    /// Input is accepted only while in progress and not paused.
    pub fn ensure_playable(&self) -> Result<(), AttemptError> {
        match self.phase() {
            AttemptPhase::Solved => return Err(AttemptError::AlreadySolved),
            AttemptPhase::GameOver => return Err(AttemptError::NoLivesLeft),
            AttemptPhase::InProgress => {}
        }
        if self.state.is_paused {
            return Err(AttemptError::Paused);
        }
        Ok(())
    }

    /// Select a tile. Returns a verdict once the answer reaches the target length.
    pub fn select(
        &mut self,
        tile: usize,
        now: i64,
        policy: &LivesPolicy,
    ) -> Result<Option<AnswerVerdict>, AttemptError> {
        self.ensure_playable()?;
        if tile >= self.level.available_letters.len() {
            return Err(AttemptError::TileOutOfRange(tile));
        }
        if self.state.is_removed(tile) {
            return Err(AttemptError::TileRemoved(tile));
        }
        if self.state.is_used(tile) {
            return Err(AttemptError::TileAlreadyUsed(tile));
        }
        if self.state.used_tiles.len() >= self.level.answer_length as usize {
            return Err(AttemptError::AnswerFull);
        }

        self.state.used_tiles.push(tile);

        if self.state.used_tiles.len() == self.level.answer_length as usize {
            Ok(Some(self.check_answer(now, policy)))
        } else {
            Ok(None)
        }
    }

    fn check_answer(&mut self, now: i64, policy: &LivesPolicy) -> AnswerVerdict {
        if normalize_answer(&self.player_answer()) == self.level.normalized_answer() {
            let completion_time_secs = self.elapsed_secs(now);
            self.solved_at = Some(now);
            return AnswerVerdict::Correct {
                stars_earned: self.stars_earned(),
                completion_time_secs,
            };
        }

        self.state.current_lives = self.state.current_lives.saturating_sub(1);
        self.state.used_tiles.clear();
        self.state.lives_depleted_at = policy.on_life_lost(
            self.state.current_lives,
            self.level.max_lives,
            self.state.lives_depleted_at,
            now,
        );

        if self.state.current_lives == 0 {
            AnswerVerdict::GameOver
        } else {
            AnswerVerdict::Wrong {
                lives_left: self.state.current_lives,
            }
        }
    }

    /// Undo the most recent selection. `Ok(None)` when nothing is selected.
    pub fn delete_last(&mut self) -> Result<Option<usize>, AttemptError> {
        self.ensure_playable()?;
        Ok(self.state.used_tiles.pop())
    }

    /// Undo every selection, returning how many were cleared.
    pub fn clear_all(&mut self) -> Result<usize, AttemptError> {
        self.ensure_playable()?;
        let cleared = self.state.used_tiles.len();
        self.state.used_tiles.clear();
        Ok(cleared)
    }

    pub fn pause(&mut self, now: i64) -> Result<(), AttemptError> {
        if self.solved_at.is_some() {
            return Err(AttemptError::AlreadySolved);
        }
        if self.state.is_paused {
            return Err(AttemptError::Paused);
        }
        self.state.is_paused = true;
        self.state.pause_time = Some(now);
        Ok(())
    }

    /// Resume and shift the start time forward by the paused duration.
    pub fn resume(&mut self, now: i64) -> Result<(), AttemptError> {
        if !self.state.is_paused {
            return Err(AttemptError::NotPaused);
        }
        if let Some(paused_at) = self.state.pause_time.take() {
            self.state.start_time += (now - paused_at).max(0);
        }
        self.state.is_paused = false;
        Ok(())
    }

    /// Throw the session away and start over with full lives.
    pub fn restart(&mut self, now: i64) {
        self.state = LevelGameState::fresh(&self.level, now);
        self.solved_at = None;
    }

    /// Record tiles hidden by a hint that was paid for.
    pub fn apply_hint(&mut self, removed: &[usize]) {
        self.state.removed_tiles.extend_from_slice(removed);
        self.state.hints_used_count += 1;
    }

    /// Replace the session state with one returned by the store.
    pub fn replace_state(&mut self, state: LevelGameState) {
        self.state = state;
    }

    /// Apply elapsed regeneration time. Returns true if lives changed.
    pub fn regenerate_lives(&mut self, now: i64, policy: &LivesPolicy) -> bool {
        let recovery = policy.regenerate(
            self.state.current_lives,
            self.level.max_lives,
            self.state.lives_depleted_at,
            now,
        );
        let changed = recovery.lives != self.state.current_lives;
        self.state.current_lives = recovery.lives;
        self.state.lives_depleted_at = recovery.timer_started_at;
        changed
    }

    pub fn refill_lives(&mut self) {
        self.state.current_lives = self.level.max_lives;
        self.state.lives_depleted_at = None;
    }

    pub fn next_life_in_secs(&self, now: i64, policy: &LivesPolicy) -> Option<i64> {
        if self.solved_at.is_some() {
            return None;
        }
        policy.remaining_secs(self.state.lives_depleted_at, now)
    }

    /// Seconds of active play. Frozen while paused and after solving.
    pub fn elapsed_secs(&self, now: i64) -> i64 {
        let reference = match (self.solved_at, self.state.pause_time) {
            (Some(solved), _) => solved,
            (None, Some(paused)) if self.state.is_paused => paused,
            _ => now,
        };
        ((reference - self.state.start_time).max(0)) / 1000
    }
}
