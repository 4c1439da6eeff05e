//! SQLite-backed repository for categories, levels and the player's wallet.

use std::sync::Mutex;

use puzzle::hint::choose_tiles_to_remove;
use puzzle::rules::{can_unlock, is_perfect_solve, unlock_cost, unlock_shortfall};
use puzzle::{
    Category, CategoryStats, Currency, HintKind, Level, LevelGameState, PlayerProgress,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::dao::{CategoryDao, CategoryStatsDao, LevelDao, LevelStateDao, PlayerProgressDao};
use crate::persistence::outcomes::{
    HintOutcome, LevelCompletion, RefillOutcome, UnlockOutcome,
};
use crate::persistence::traits::GameRepository;
use crate::persistence::PersistenceError;

/// SQLite implementation of [`GameRepository`].
pub struct SqliteGameRepository {
    pool: SqlitePool,
    rng: Mutex<StdRng>,
}

impl SqliteGameRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic hint selection, for tests and replays.
    pub fn with_seed(pool: SqlitePool, seed: u64) -> Self {
        Self {
            pool,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick_hint_tiles(&self, level: &Level, state: &LevelGameState, kind: HintKind) -> Vec<usize> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        choose_tiles_to_remove(level, state, kind, &mut *rng)
    }
}

impl GameRepository for SqliteGameRepository {
    async fn categories(&self) -> Result<Vec<Category>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        CategoryDao::list(&mut *conn).await
    }

    async fn category(&self, id: i64) -> Result<Option<Category>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        CategoryDao::find(&mut *conn, id).await
    }

    async fn levels(&self, category_id: i64) -> Result<Vec<Level>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        LevelDao::list_by_category(&mut *conn, category_id).await
    }

    async fn level(&self, id: i64) -> Result<Option<Level>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        LevelDao::find(&mut *conn, id).await
    }

    async fn next_level(&self, level_id: i64) -> Result<Option<Level>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        let Some(level) = LevelDao::find(&mut *conn, level_id).await? else {
            return Ok(None);
        };
        LevelDao::find_by_number(&mut *conn, level.category_id, level.level_number + 1).await
    }

    async fn progress(&self) -> Result<PlayerProgress, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        PlayerProgressDao::get_or_create(&mut *conn).await
    }

    async fn category_stats(
        &self,
        category_id: i64,
    ) -> Result<Option<CategoryStats>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        CategoryStatsDao::find(&mut *conn, category_id).await
    }

    async fn level_state(&self, level_id: i64) -> Result<Option<LevelGameState>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        LevelStateDao::find(&mut *conn, level_id).await
    }

    async fn unlock_category(&self, id: i64) -> Result<UnlockOutcome, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let Some(category) = CategoryDao::find(&mut *tx, id).await? else {
            debug!(category_id = id, "Unlock requested for unknown category");
            return Ok(UnlockOutcome::NotFound);
        };
        if category.is_unlocked {
            return Ok(UnlockOutcome::AlreadyUnlocked);
        }

        let progress = PlayerProgressDao::get_or_create(&mut *tx).await?;
        if !can_unlock(&category, &progress) {
            return Ok(UnlockOutcome::Insufficient(unlock_shortfall(&category, &progress)));
        }

        CategoryDao::set_unlocked(&mut *tx, id, true).await?;
        PlayerProgressDao::deduct_floored(&mut *tx, unlock_cost(&category)).await?;
        let progress = PlayerProgressDao::get_or_create(&mut *tx).await?;

        tx.commit().await?;
        info!(category_id = id, name = %category.name, "Category unlocked");
        Ok(UnlockOutcome::Unlocked { progress })
    }

    async fn start_level(
        &self,
        level_id: i64,
        now: i64,
    ) -> Result<Option<(Level, LevelGameState)>, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let Some(level) = LevelDao::find(&mut *tx, level_id).await? else {
            return Ok(None);
        };
        let state = match LevelStateDao::find(&mut *tx, level_id).await? {
            Some(state) => state,
            None => {
                let state = LevelGameState::fresh(&level, now);
                LevelStateDao::upsert(&mut *tx, &state).await?;
                state
            }
        };
        PlayerProgressDao::set_current_level(&mut *tx, level_id, now).await?;

        tx.commit().await?;
        Ok(Some((level, state)))
    }

    async fn save_level_state(&self, state: &LevelGameState) -> Result<(), PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        LevelStateDao::upsert(&mut *conn, state).await
    }

    async fn restart_level(
        &self,
        level_id: i64,
        now: i64,
    ) -> Result<Option<LevelGameState>, PersistenceError> {
        let mut tx = self.pool.begin().await?;
        let Some(level) = LevelDao::find(&mut *tx, level_id).await? else {
            return Ok(None);
        };
        let state = LevelGameState::fresh(&level, now);
        LevelStateDao::upsert(&mut *tx, &state).await?;
        tx.commit().await?;
        Ok(Some(state))
    }

    async fn complete_level(
        &self,
        level_id: i64,
        stars_earned: u32,
        completion_time_secs: i64,
        now: i64,
    ) -> Result<Option<LevelCompletion>, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let Some(level) = LevelDao::find(&mut *tx, level_id).await? else {
            debug!(level_id, "Completion reported for unknown level");
            return Ok(None);
        };
        let perfect = match LevelStateDao::find(&mut *tx, level_id).await? {
            Some(state) => is_perfect_solve(&level, state.hints_used_count, state.current_lives),
            None => stars_earned >= level.stars_reward,
        };

        LevelDao::mark_completed(&mut *tx, level_id, stars_earned, completion_time_secs).await?;
        PlayerProgressDao::record_completion(
            &mut *tx,
            stars_earned,
            level.coins_reward,
            completion_time_secs,
            perfect,
            now,
        )
        .await?;
        CategoryStatsDao::refresh(&mut *tx, level.category_id, Some(level.level_number)).await?;
        LevelStateDao::delete(&mut *tx, level_id).await?;

        let next =
            LevelDao::find_by_number(&mut *tx, level.category_id, level.level_number + 1).await?;
        if let Some(next) = &next {
            LevelDao::unlock(&mut *tx, next.id).await?;
        }

        let category_completed = CategoryStatsDao::find(&mut *tx, level.category_id)
            .await?
            .is_some_and(|s| s.total_levels > 0 && s.completed_levels == s.total_levels);

        tx.commit().await?;

        info!(
            level_id,
            stars_earned,
            coins = level.coins_reward,
            completion_time_secs,
            "Level completed"
        );
        Ok(Some(LevelCompletion {
            level_id,
            stars_earned,
            coins_earned: level.coins_reward,
            completion_time: completion_time_secs,
            next_level_id: next.map(|l| l.id),
            perfect,
            category_completed,
        }))
    }

    async fn use_hint(
        &self,
        level_id: i64,
        kind: HintKind,
        now: i64,
    ) -> Result<HintOutcome, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let Some(level) = LevelDao::find(&mut *tx, level_id).await? else {
            return Ok(HintOutcome::LevelNotFound);
        };
        let mut state = LevelStateDao::find(&mut *tx, level_id)
            .await?
            .unwrap_or_else(|| LevelGameState::fresh(&level, now));
        let progress = PlayerProgressDao::get_or_create(&mut *tx).await?;

        if progress.total_coins < level.hint_cost {
            return Ok(HintOutcome::InsufficientCoins {
                required: level.hint_cost,
                available: progress.total_coins,
            });
        }

        let removed = self.pick_hint_tiles(&level, &state, kind);
        if removed.is_empty() {
            return Ok(HintOutcome::NothingToRemove);
        }

        // Conditional spend guards against a concurrent wallet change.
        if !PlayerProgressDao::spend_coins(&mut *tx, level.hint_cost).await? {
            let progress = PlayerProgressDao::get_or_create(&mut *tx).await?;
            return Ok(HintOutcome::InsufficientCoins {
                required: level.hint_cost,
                available: progress.total_coins,
            });
        }
        PlayerProgressDao::increment_hints_used(&mut *tx).await?;

        state.removed_tiles.extend_from_slice(&removed);
        state.hints_used_count += 1;
        LevelStateDao::upsert(&mut *tx, &state).await?;

        tx.commit().await?;

        let coins_left = progress.total_coins - level.hint_cost;
        debug!(level_id, ?kind, ?removed, coins_left, "Hint applied");
        Ok(HintOutcome::Applied {
            removed,
            state,
            coins_left,
        })
    }

    async fn refill_lives(&self, level_id: i64, cost: i64) -> Result<RefillOutcome, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let Some(level) = LevelDao::find(&mut *tx, level_id).await? else {
            return Ok(RefillOutcome::LevelNotFound);
        };
        let Some(mut state) = LevelStateDao::find(&mut *tx, level_id).await? else {
            return Ok(RefillOutcome::LevelNotFound);
        };

        if cost > 0 && !PlayerProgressDao::spend_coins(&mut *tx, cost).await? {
            let progress = PlayerProgressDao::get_or_create(&mut *tx).await?;
            return Ok(RefillOutcome::InsufficientCoins {
                required: cost,
                available: progress.total_coins,
            });
        }

        state.current_lives = level.max_lives;
        state.lives_depleted_at = None;
        LevelStateDao::upsert(&mut *tx, &state).await?;

        tx.commit().await?;
        info!(level_id, cost, "Lives refilled");
        Ok(RefillOutcome::Refilled(state))
    }

    async fn grant_reward(
        &self,
        currency: Currency,
        amount: i64,
    ) -> Result<PlayerProgress, PersistenceError> {
        let mut tx = self.pool.begin().await?;
        PlayerProgressDao::add_currency(&mut *tx, currency, amount).await?;
        let progress = PlayerProgressDao::get_or_create(&mut *tx).await?;
        tx.commit().await?;
        info!(%currency, amount, "Reward granted");
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;

    const NOW: i64 = 1_700_000_000_000;

    async fn test_db() -> (Database, SqliteGameRepository) {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteGameRepository::with_seed(db.pool().clone(), 7);
        (db, repo)
    }

    async fn first_level(repo: &SqliteGameRepository) -> Level {
        repo.levels(1).await.unwrap().remove(0)
    }

    async fn set_wallet(db: &Database, stars: i64, coins: i64, vip_points: i64) {
        sqlx::query("INSERT OR IGNORE INTO player_progress (id) VALUES (1)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(
            "UPDATE player_progress SET total_stars = ?, total_coins = ?, vip_points = ? WHERE id = 1",
        )
        .bind(stars)
        .bind(coins)
        .bind(vip_points)
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_new_player_wallet() {
        let (_db, repo) = test_db().await;
        let progress = repo.progress().await.unwrap();
        assert_eq!(progress.total_coins, 100);
        assert_eq!(progress.total_stars, 0);
        // get-or-create is stable
        assert_eq!(repo.progress().await.unwrap(), progress);
    }

    #[tokio::test]
    async fn test_categories_are_ordered() {
        let (_db, repo) = test_db().await;
        let categories = repo.categories().await.unwrap();
        let orders: Vec<i64> = categories.iter().map(|c| c.sort_order).collect();
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        assert_eq!(orders, sorted);
    }

    #[tokio::test]
    async fn test_unlock_fails_without_stars() {
        let (_db, repo) = test_db().await;
        let before = repo.progress().await.unwrap();

        let outcome = repo.unlock_category(2).await.unwrap();
        match outcome {
            UnlockOutcome::Insufficient(shortfall) => {
                assert_eq!(shortfall.stars, 5);
                assert_eq!(shortfall.coins, 0);
            }
            other => panic!("expected insufficient, got {other:?}"),
        }
        assert_eq!(repo.progress().await.unwrap(), before);
        assert!(!repo.category(2).await.unwrap().unwrap().is_unlocked);
    }

    #[tokio::test]
    async fn test_unlock_deducts_stars_and_coins() {
        let (db, repo) = test_db().await;
        set_wallet(&db, 7, 60, 0).await;

        let outcome = repo.unlock_category(2).await.unwrap();
        let UnlockOutcome::Unlocked { progress } = outcome else {
            panic!("expected unlock, got {outcome:?}");
        };
        assert_eq!(progress.total_stars, 2);
        assert_eq!(progress.total_coins, 10);
        assert!(repo.category(2).await.unwrap().unwrap().is_unlocked);

        assert_eq!(repo.unlock_category(2).await.unwrap(), UnlockOutcome::AlreadyUnlocked);
    }

    #[tokio::test]
    async fn test_vip_unlock_spends_only_vip_points() {
        let (db, repo) = test_db().await;
        set_wallet(&db, 0, 0, 50).await;

        let outcome = repo.unlock_category(6).await.unwrap();
        let UnlockOutcome::Unlocked { progress } = outcome else {
            panic!("expected unlock, got {outcome:?}");
        };
        assert_eq!(progress.vip_points, 0);
        assert_eq!(progress.total_coins, 0);
        assert_eq!(progress.total_stars, 0);
    }

    #[tokio::test]
    async fn test_unlock_unknown_category() {
        let (_db, repo) = test_db().await;
        assert_eq!(repo.unlock_category(999).await.unwrap(), UnlockOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_hinted_solve_is_not_perfect_on_low_reward_level() {
        let (db, repo) = test_db().await;
        let level = first_level(&repo).await;
        sqlx::query("UPDATE game_levels SET stars_reward = 1 WHERE id = ?")
            .bind(level.id)
            .execute(db.pool())
            .await
            .unwrap();
        repo.start_level(level.id, NOW).await.unwrap().unwrap();
        let outcome = repo
            .use_hint(level.id, HintKind::RemoveTwoLetters, NOW)
            .await
            .unwrap();
        assert!(matches!(outcome, HintOutcome::Applied { .. }));

        let completion = repo.complete_level(level.id, 1, 20, NOW).await.unwrap().unwrap();
        assert_eq!(completion.stars_earned, 1);
        assert!(!completion.perfect);
        assert_eq!(repo.progress().await.unwrap().perfect_levels, 0);
    }

    #[tokio::test]
    async fn test_perfect_completion_credits_rewards() {
        let (_db, repo) = test_db().await;
        let level = first_level(&repo).await;
        repo.start_level(level.id, NOW).await.unwrap().unwrap();

        let completion = repo.complete_level(level.id, 3, 42, NOW).await.unwrap().unwrap();
        assert_eq!(completion.stars_earned, 3);
        assert_eq!(completion.coins_earned, 5);
        assert!(completion.perfect);
        assert!(!completion.category_completed);

        let progress = repo.progress().await.unwrap();
        assert_eq!(progress.total_stars, 3);
        assert_eq!(progress.total_coins, 105);
        assert_eq!(progress.total_completed_levels, 1);
        assert_eq!(progress.perfect_levels, 1);
        assert_eq!(progress.total_play_time, 42);

        let stats = repo.category_stats(1).await.unwrap().unwrap();
        assert_eq!(stats.completed_levels, 1);
        assert_eq!(stats.stars_earned, 3);
        assert_eq!(stats.best_time, Some(42));
        assert_eq!(stats.last_played_level, Some(1));

        assert!(repo.level_state(level.id).await.unwrap().is_none());

        let next = repo.level(completion.next_level_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(next.level_number, 2);
        assert!(next.is_unlocked);

        let category = repo.category(1).await.unwrap().unwrap();
        assert_eq!(category.completed_levels, 1);
    }

    #[tokio::test]
    async fn test_replay_keeps_best_stars() {
        let (_db, repo) = test_db().await;
        let level = first_level(&repo).await;
        repo.complete_level(level.id, 3, 40, NOW).await.unwrap();
        repo.complete_level(level.id, 1, 90, NOW).await.unwrap();

        let level = repo.level(level.id).await.unwrap().unwrap();
        assert_eq!(level.stars_earned, 3);
        assert_eq!(level.completion_time, Some(40));

        let stats = repo.category_stats(1).await.unwrap().unwrap();
        assert_eq!(stats.completed_levels, 1);
        assert_eq!(stats.stars_earned, 3);

        let progress = repo.progress().await.unwrap();
        assert_eq!(progress.total_completed_levels, 2);
        assert_eq!(progress.total_stars, 4);
    }

    #[tokio::test]
    async fn test_completing_unknown_level_writes_nothing() {
        let (_db, repo) = test_db().await;
        let before = repo.progress().await.unwrap();
        assert!(repo.complete_level(999, 3, 10, NOW).await.unwrap().is_none());
        assert_eq!(repo.progress().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_completing_last_level_completes_category() {
        let (_db, repo) = test_db().await;
        let daily = repo
            .categories()
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.is_daily_category)
            .unwrap();
        let levels = repo.levels(daily.id).await.unwrap();
        let mut last = None;
        for level in &levels {
            last = repo.complete_level(level.id, 1, 5, NOW).await.unwrap();
        }
        let last = last.unwrap();
        assert!(last.category_completed);
        assert!(last.next_level_id.is_none());
    }

    #[tokio::test]
    async fn test_hint_removes_letters_outside_answer() {
        let (_db, repo) = test_db().await;
        let level = first_level(&repo).await;
        repo.start_level(level.id, NOW).await.unwrap();

        let outcome = repo.use_hint(level.id, HintKind::RemoveRandomLetters, NOW).await.unwrap();
        let HintOutcome::Applied { removed, state, coins_left } = outcome else {
            panic!("expected hint to apply, got {outcome:?}");
        };
        assert_eq!(removed.len(), 2);
        assert_eq!(coins_left, 90);
        assert_eq!(state.hints_used_count, 1);
        for tile in &removed {
            assert!(!level.answer_contains(level.available_letters[*tile]));
        }

        let stored = repo.level_state(level.id).await.unwrap().unwrap();
        assert_eq!(stored.removed_tiles, removed);
        let progress = repo.progress().await.unwrap();
        assert_eq!(progress.total_coins, 90);
        assert_eq!(progress.hints_used, 1);
    }

    #[tokio::test]
    async fn test_hint_without_coins_changes_nothing() {
        let (db, repo) = test_db().await;
        let level = first_level(&repo).await;
        repo.start_level(level.id, NOW).await.unwrap();
        set_wallet(&db, 0, 5, 0).await;

        let outcome = repo.use_hint(level.id, HintKind::RemoveTwoLetters, NOW).await.unwrap();
        assert_eq!(
            outcome,
            HintOutcome::InsufficientCoins {
                required: 10,
                available: 5
            }
        );
        let progress = repo.progress().await.unwrap();
        assert_eq!(progress.total_coins, 5);
        assert_eq!(progress.hints_used, 0);
        let state = repo.level_state(level.id).await.unwrap().unwrap();
        assert!(state.removed_tiles.is_empty());
        assert_eq!(state.hints_used_count, 0);
    }

    #[tokio::test]
    async fn test_hint_with_no_decoys_left_is_free() {
        let (_db, repo) = test_db().await;
        let level = first_level(&repo).await;
        repo.start_level(level.id, NOW).await.unwrap();

        let decoys = puzzle::hint::removable_tiles(&level, &LevelGameState::fresh(&level, NOW));
        let mut state = repo.level_state(level.id).await.unwrap().unwrap();
        state.removed_tiles = decoys;
        repo.save_level_state(&state).await.unwrap();

        let outcome = repo.use_hint(level.id, HintKind::RemoveRandomLetters, NOW).await.unwrap();
        assert_eq!(outcome, HintOutcome::NothingToRemove);
        assert_eq!(repo.progress().await.unwrap().total_coins, 100);
    }

    #[tokio::test]
    async fn test_restart_resets_state() {
        let (_db, repo) = test_db().await;
        let level = first_level(&repo).await;
        let (_, mut state) = repo.start_level(level.id, NOW).await.unwrap().unwrap();
        state.current_lives = 1;
        state.used_tiles = vec![0, 1];
        state.removed_tiles = vec![2];
        repo.save_level_state(&state).await.unwrap();

        let fresh = repo.restart_level(level.id, NOW + 5_000).await.unwrap().unwrap();
        assert_eq!(fresh.current_lives, level.max_lives);
        assert!(fresh.used_tiles.is_empty());
        assert!(fresh.removed_tiles.is_empty());
        assert_eq!(fresh.start_time, NOW + 5_000);
        assert_eq!(repo.level_state(level.id).await.unwrap().unwrap(), fresh);
    }

    #[tokio::test]
    async fn test_start_level_resumes_saved_state() {
        let (_db, repo) = test_db().await;
        let level = first_level(&repo).await;
        let (_, mut state) = repo.start_level(level.id, NOW).await.unwrap().unwrap();
        state.used_tiles = vec![3];
        repo.save_level_state(&state).await.unwrap();

        let (_, resumed) = repo.start_level(level.id, NOW + 60_000).await.unwrap().unwrap();
        assert_eq!(resumed, state);
        let progress = repo.progress().await.unwrap();
        assert_eq!(progress.current_level_id, Some(level.id));
        assert_eq!(progress.last_played, Some(NOW + 60_000));
    }

    #[tokio::test]
    async fn test_refill_lives_spends_coins() {
        let (_db, repo) = test_db().await;
        let level = first_level(&repo).await;
        let (_, mut state) = repo.start_level(level.id, NOW).await.unwrap().unwrap();
        state.current_lives = 0;
        state.lives_depleted_at = Some(NOW);
        repo.save_level_state(&state).await.unwrap();

        let RefillOutcome::Refilled(state) = repo.refill_lives(level.id, 40).await.unwrap() else {
            panic!("expected refill");
        };
        assert_eq!(state.current_lives, level.max_lives);
        assert_eq!(state.lives_depleted_at, None);
        assert_eq!(repo.progress().await.unwrap().total_coins, 60);

        assert_eq!(
            repo.refill_lives(level.id, 500).await.unwrap(),
            RefillOutcome::InsufficientCoins {
                required: 500,
                available: 60
            }
        );
    }

    #[tokio::test]
    async fn test_grant_reward() {
        let (_db, repo) = test_db().await;
        let progress = repo.grant_reward(Currency::Stars, 4).await.unwrap();
        assert_eq!(progress.total_stars, 4);
        let progress = repo.grant_reward(Currency::VipPoints, 2).await.unwrap();
        assert_eq!(progress.vip_points, 2);
        assert_eq!(progress.total_coins, 100);
    }
}
