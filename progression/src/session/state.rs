use std::sync::Arc;

use puzzle::{AnswerVerdict, AttemptPhase, Clock, HintKind, LevelAttempt};
use tracing::{debug, info, warn};

use super::commands::SessionError;
use super::snapshot::{LevelSnapshot, TileView};
use crate::config::GameConfig;
use crate::persistence::{
    GameRepository, HintOutcome, LevelCompletion, PersistenceError, RefillOutcome,
};
use crate::rewards::{AdOutcome, RewardKind};

/// Everything the actor owns for one opened level.
pub struct LevelSessionState<R> {
    pub session_id: String,
    attempt: LevelAttempt,
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    config: GameConfig,
    completion: Option<LevelCompletion>,
    info_message: Option<String>,
    error_message: Option<String>,
}

impl<R: GameRepository> LevelSessionState<R> {
    pub fn new(
        session_id: String,
        attempt: LevelAttempt,
        repo: Arc<R>,
        clock: Arc<dyn Clock>,
        config: GameConfig,
    ) -> Self {
        Self {
            session_id,
            attempt,
            repo,
            clock,
            config,
            completion: None,
            info_message: None,
            error_message: None,
        }
    }

    pub fn level_id(&self) -> i64 {
        self.attempt.level().id
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        let now = self.clock.now_millis();
        let level = self.attempt.level();
        let state = self.attempt.state();
        let tiles = level
            .available_letters
            .iter()
            .enumerate()
            .map(|(index, &letter)| TileView {
                index,
                letter,
                selected: state.is_used(index),
                removed: state.is_removed(index),
            })
            .collect();

        LevelSnapshot {
            session_id: self.session_id.clone(),
            level_id: level.id,
            category_id: level.category_id,
            level_number: level.level_number,
            question: level.question.clone(),
            image: level.image.clone(),
            answer_length: level.answer_length,
            tiles,
            player_answer: self.attempt.player_answer(),
            phase: self.attempt.phase(),
            is_paused: self.attempt.is_paused(),
            current_lives: state.current_lives,
            max_lives: level.max_lives,
            hints_used: state.hints_used_count,
            hint_cost: level.hint_cost,
            stars: self
                .completion
                .as_ref()
                .map_or_else(|| self.attempt.stars_earned(), |c| c.stars_earned),
            elapsed_secs: self.attempt.elapsed_secs(now),
            next_life_in_secs: self.attempt.next_life_in_secs(now, &self.config.lives),
            completion: self.completion.clone(),
            info_message: self.info_message.clone(),
            error_message: self.error_message.clone(),
        }
    }

    /// Record a storage failure on the state and convert it for the caller.
    fn storage_failed(&mut self, e: PersistenceError) -> SessionError {
        warn!(level_id = self.level_id(), "Storage failure: {e}");
        let err = SessionError::from(e);
        self.error_message = Some(err.to_string());
        err
    }

    async fn persist_state(&mut self) -> Result<(), SessionError> {
        let state = self.attempt.state().clone();
        match self.repo.save_level_state(&state).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.storage_failed(e)),
        }
    }

    fn begin_command(&mut self) {
        self.info_message = None;
        self.error_message = None;
    }

    pub async fn select_tile(&mut self, tile: usize) -> Result<LevelSnapshot, SessionError> {
        self.begin_command();
        let now = self.clock.now_millis();
        let before = self.attempt.clone();
        let verdict = self.attempt.select(tile, now, &self.config.lives)?;

        match verdict {
            Some(AnswerVerdict::Correct {
                stars_earned,
                completion_time_secs,
            }) => {
                let result = self
                    .repo
                    .complete_level(self.level_id(), stars_earned, completion_time_secs, now)
                    .await;
                match result {
                    Ok(completion) => {
                        info!(stars_earned, completion_time_secs, "Level solved");
                        self.completion = completion;
                    }
                    Err(e) => {
                        // Nothing was credited; the final tile can be placed again.
                        self.attempt = before;
                        return Err(self.storage_failed(e));
                    }
                }
            }
            Some(AnswerVerdict::Wrong { lives_left }) => {
                self.info_message = Some(format!("Wrong answer, {lives_left} lives left"));
                self.persist_state().await?;
            }
            Some(AnswerVerdict::GameOver) => {
                self.info_message = Some("Out of lives".to_string());
                self.persist_state().await?;
            }
            None => self.persist_state().await?,
        }
        Ok(self.snapshot())
    }

    pub async fn delete_last(&mut self) -> Result<LevelSnapshot, SessionError> {
        self.begin_command();
        if self.attempt.delete_last()?.is_some() {
            self.persist_state().await?;
        }
        Ok(self.snapshot())
    }

    pub async fn clear_all(&mut self) -> Result<LevelSnapshot, SessionError> {
        self.begin_command();
        if self.attempt.clear_all()? > 0 {
            self.persist_state().await?;
        }
        Ok(self.snapshot())
    }

    pub async fn use_hint(&mut self, kind: HintKind) -> Result<LevelSnapshot, SessionError> {
        self.begin_command();
        self.attempt.ensure_playable()?;
        let now = self.clock.now_millis();

        let outcome = match self.repo.use_hint(self.level_id(), kind, now).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.storage_failed(e)),
        };
        match outcome {
            HintOutcome::Applied {
                removed,
                coins_left,
                ..
            } => {
                debug!(?removed, coins_left, "Hint applied");
                self.attempt.apply_hint(&removed);
                Ok(self.snapshot())
            }
            HintOutcome::InsufficientCoins {
                required,
                available,
            } => {
                let err = SessionError::InsufficientCoins {
                    required,
                    available,
                };
                self.info_message = Some(err.to_string());
                Err(err)
            }
            HintOutcome::NothingToRemove => {
                self.info_message = Some(SessionError::NothingToRemove.to_string());
                Err(SessionError::NothingToRemove)
            }
            HintOutcome::LevelNotFound => Err(SessionError::LevelNotFound(self.level_id())),
        }
    }

    pub async fn pause(&mut self) -> Result<LevelSnapshot, SessionError> {
        self.begin_command();
        self.attempt.pause(self.clock.now_millis())?;
        self.persist_state().await?;
        Ok(self.snapshot())
    }

    pub async fn resume(&mut self) -> Result<LevelSnapshot, SessionError> {
        self.begin_command();
        self.attempt.resume(self.clock.now_millis())?;
        self.persist_state().await?;
        Ok(self.snapshot())
    }

    pub async fn restart(&mut self) -> Result<LevelSnapshot, SessionError> {
        self.begin_command();
        let now = self.clock.now_millis();
        let fresh = match self.repo.restart_level(self.level_id(), now).await {
            Ok(Some(state)) => state,
            Ok(None) => return Err(SessionError::LevelNotFound(self.level_id())),
            Err(e) => return Err(self.storage_failed(e)),
        };
        self.attempt.restart(now);
        self.attempt.replace_state(fresh);
        self.completion = None;
        Ok(self.snapshot())
    }

    async fn refill(&mut self, cost: i64) -> Result<LevelSnapshot, SessionError> {
        if self.attempt.phase() == AttemptPhase::Solved {
            return Err(puzzle::AttemptError::AlreadySolved.into());
        }
        // The stored row must match before the repository reads it back.
        self.persist_state().await?;
        let outcome = match self.repo.refill_lives(self.level_id(), cost).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.storage_failed(e)),
        };
        match outcome {
            RefillOutcome::Refilled(state) => {
                self.attempt.replace_state(state);
                Ok(self.snapshot())
            }
            RefillOutcome::InsufficientCoins {
                required,
                available,
            } => {
                let err = SessionError::InsufficientCoins {
                    required,
                    available,
                };
                self.info_message = Some(err.to_string());
                Err(err)
            }
            RefillOutcome::LevelNotFound => Err(SessionError::LevelNotFound(self.level_id())),
        }
    }

    pub async fn refill_lives(&mut self) -> Result<LevelSnapshot, SessionError> {
        self.begin_command();
        self.refill(self.config.refill_cost).await
    }

    pub async fn on_ad_result(&mut self, outcome: AdOutcome) -> Result<LevelSnapshot, SessionError> {
        self.begin_command();
        match outcome {
            AdOutcome::Closed => {
                self.info_message = Some("Ad closed before the reward was earned".to_string());
                Ok(self.snapshot())
            }
            AdOutcome::Rewarded(reward) => match reward.kind {
                RewardKind::Lives => self.refill(0).await,
                RewardKind::Currency(currency) => {
                    match self.repo.grant_reward(currency, reward.amount).await {
                        Ok(_) => {
                            self.info_message = Some(format!("+{} {currency}", reward.amount));
                            Ok(self.snapshot())
                        }
                        Err(e) => Err(self.storage_failed(e)),
                    }
                }
            },
        }
    }

    /// True while a regeneration timer is counting down.
    pub fn timer_active(&self) -> bool {
        self.attempt.phase() != AttemptPhase::Solved
            && self.attempt.state().lives_depleted_at.is_some()
    }

    /// Apply elapsed regeneration time. Returns true when lives changed.
    pub async fn tick(&mut self) -> Result<bool, SessionError> {
        let now = self.clock.now_millis();
        if !self.attempt.regenerate_lives(now, &self.config.lives) {
            return Ok(false);
        }
        info!(lives = self.attempt.state().current_lives, "Lives regenerated");
        self.persist_state().await?;
        Ok(true)
    }
}
