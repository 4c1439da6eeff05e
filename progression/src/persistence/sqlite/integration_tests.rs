//! End-to-end progression flows across both repositories and the attempt
//! state machine.

use puzzle::{
    AnswerVerdict, HintKind, Level, LevelAttempt, LivesPolicy, RegenerationMode,
};

use super::{Database, SqliteDailyRewardRepository, SqliteGameRepository};
use crate::persistence::traits::{DailyRewardRepository, GameRepository};
use crate::persistence::{ClaimOutcome, HintOutcome, UnlockOutcome};

const NOW: i64 = 1_700_000_000_000;

/// Tiles of the first Countries level, "FRANCE": N Q F R T A O C E L.
const FRANCE: [usize; 6] = [2, 3, 5, 0, 7, 8];
const WRONG: [usize; 6] = [1, 4, 6, 9, 0, 5];

async fn setup() -> (Database, SqliteGameRepository, SqliteDailyRewardRepository) {
    let db = Database::new_in_memory().await.unwrap();
    let game = SqliteGameRepository::with_seed(db.pool().clone(), 42);
    let daily = SqliteDailyRewardRepository::new(db.pool().clone());
    (db, game, daily)
}

async fn open_first_level(repo: &SqliteGameRepository) -> LevelAttempt {
    let level: Level = repo.levels(1).await.unwrap().remove(0);
    assert_eq!(level.answer, "FRANCE");
    let (level, state) = repo.start_level(level.id, NOW).await.unwrap().unwrap();
    LevelAttempt::new(level, state)
}

fn spell(attempt: &mut LevelAttempt, tiles: &[usize], now: i64) -> Option<AnswerVerdict> {
    let policy = LivesPolicy::default();
    let mut verdict = None;
    for &tile in tiles {
        verdict = attempt.select(tile, now, &policy).unwrap();
    }
    verdict
}

async fn solve_and_complete(
    repo: &SqliteGameRepository,
    attempt: &mut LevelAttempt,
    now: i64,
) -> u32 {
    let Some(AnswerVerdict::Correct {
        stars_earned,
        completion_time_secs,
    }) = spell(attempt, &FRANCE, now)
    else {
        panic!("expected a correct answer");
    };
    repo.complete_level(attempt.level().id, stars_earned, completion_time_secs, now)
        .await
        .unwrap()
        .unwrap();
    stars_earned
}

#[tokio::test]
async fn test_new_player_cannot_unlock_animals() {
    let (_db, game, _daily) = setup().await;
    let before = game.progress().await.unwrap();
    let outcome = game.unlock_category(2).await.unwrap();
    assert!(matches!(outcome, UnlockOutcome::Insufficient(s) if s.stars == 5));
    assert_eq!(game.progress().await.unwrap(), before);
}

#[tokio::test]
async fn test_clean_solve_earns_full_stars() {
    let (_db, game, _daily) = setup().await;
    let mut attempt = open_first_level(&game).await;

    let stars = solve_and_complete(&game, &mut attempt, NOW + 30_000).await;
    assert_eq!(stars, 3);

    let progress = game.progress().await.unwrap();
    assert_eq!(progress.total_stars, 3);
    assert_eq!(progress.total_coins, 105);
    let stats = game.category_stats(1).await.unwrap().unwrap();
    assert_eq!(stats.completed_levels, 1);
    assert_eq!(stats.stars_earned, 3);
    assert_eq!(stats.best_time, Some(30));
    assert!(game.level_state(attempt.level().id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_one_hint_one_life_earns_two_stars() {
    let (_db, game, _daily) = setup().await;
    let mut attempt = open_first_level(&game).await;
    let level_id = attempt.level().id;

    let HintOutcome::Applied { state, .. } = game
        .use_hint(level_id, HintKind::RemoveRandomLetters, NOW)
        .await
        .unwrap()
    else {
        panic!("hint should apply");
    };
    attempt.replace_state(state);

    let wrong: Vec<usize> = attempt
        .selectable_tiles()
        .into_iter()
        .filter(|t| !FRANCE.contains(t))
        .chain(FRANCE)
        .take(6)
        .collect();
    assert_eq!(
        spell(&mut attempt, &wrong, NOW),
        Some(AnswerVerdict::Wrong { lives_left: 2 })
    );
    game.save_level_state(attempt.state()).await.unwrap();

    let stars = solve_and_complete(&game, &mut attempt, NOW + 10_000).await;
    assert_eq!(stars, 2);
    let progress = game.progress().await.unwrap();
    assert_eq!(progress.total_stars, 2);
    assert_eq!(progress.total_coins, 100 - 10 + 5);
    assert_eq!(progress.perfect_levels, 0);
}

#[tokio::test]
async fn test_two_hints_two_lives_earn_one_star() {
    let (_db, game, _daily) = setup().await;
    let mut attempt = open_first_level(&game).await;
    let level_id = attempt.level().id;

    for _ in 0..2 {
        let outcome = game
            .use_hint(level_id, HintKind::RemoveTwoLetters, NOW)
            .await
            .unwrap();
        let HintOutcome::Applied { state, .. } = outcome else {
            panic!("hint should apply, got {outcome:?}");
        };
        attempt.replace_state(state);
    }
    assert_eq!(attempt.state().removed_tiles.len(), 4);

    for _ in 0..2 {
        // every decoy is gone, so reuse answer letters in the wrong order
        let reversed: Vec<usize> = FRANCE.iter().rev().copied().collect();
        assert!(matches!(
            spell(&mut attempt, &reversed, NOW),
            Some(AnswerVerdict::Wrong { .. })
        ));
    }
    assert_eq!(attempt.lives_lost(), 2);

    let stars = solve_and_complete(&game, &mut attempt, NOW).await;
    assert_eq!(stars, 1);
}

#[tokio::test]
async fn test_game_over_then_regenerate() {
    let (_db, game, _daily) = setup().await;
    let mut attempt = open_first_level(&game).await;
    let policy = LivesPolicy {
        mode: RegenerationMode::FullRefill,
        interval_secs: 60,
    };

    for expected in [Some(2), Some(1), None] {
        let mut verdict = None;
        for &tile in &WRONG {
            verdict = attempt.select(tile, NOW, &policy).unwrap();
        }
        match expected {
            Some(lives_left) => assert_eq!(verdict, Some(AnswerVerdict::Wrong { lives_left })),
            None => assert_eq!(verdict, Some(AnswerVerdict::GameOver)),
        }
    }
    game.save_level_state(attempt.state()).await.unwrap();

    let stored = game.level_state(attempt.level().id).await.unwrap().unwrap();
    assert_eq!(stored.current_lives, 0);
    assert_eq!(stored.lives_depleted_at, Some(NOW));

    assert!(!attempt.regenerate_lives(NOW + 59_000, &policy));
    assert!(attempt.regenerate_lives(NOW + 60_000, &policy));
    assert_eq!(attempt.state().current_lives, 3);
}

#[tokio::test]
async fn test_hint_without_coins_is_rejected() {
    let (db, game, _daily) = setup().await;
    let attempt = open_first_level(&game).await;
    sqlx::query("UPDATE player_progress SET total_coins = 5 WHERE id = 1")
        .execute(db.pool())
        .await
        .unwrap();

    let outcome = game
        .use_hint(attempt.level().id, HintKind::RemoveRandomLetters, NOW)
        .await
        .unwrap();
    assert!(matches!(outcome, HintOutcome::InsufficientCoins { required: 10, available: 5 }));
    assert_eq!(game.progress().await.unwrap().total_coins, 5);
    let state = game.level_state(attempt.level().id).await.unwrap().unwrap();
    assert!(state.removed_tiles.is_empty());
}

#[tokio::test]
async fn test_daily_rewards_fund_an_unlock() {
    let (_db, game, daily) = setup().await;
    let start = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    // days 1..=3: 50 + 75 coins, then 5 stars
    for offset in 0..3 {
        let day = start + chrono::Days::new(offset);
        assert!(matches!(daily.claim(day, 1.0).await.unwrap(), ClaimOutcome::Claimed(_)));
    }
    let progress = game.progress().await.unwrap();
    assert_eq!(progress.total_coins, 225);
    assert_eq!(progress.total_stars, 5);

    let outcome = game.unlock_category(2).await.unwrap();
    let UnlockOutcome::Unlocked { progress } = outcome else {
        panic!("expected unlock, got {outcome:?}");
    };
    assert_eq!(progress.total_stars, 0);
    assert_eq!(progress.total_coins, 175);
}
