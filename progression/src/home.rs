//! Home screen view-model: wallet, category cards and the daily reward.
//!
//! State is published on a `watch` channel so any number of views can follow
//! it. Intents never fail outward; storage errors land in
//! [`HomeState::error_message`].

use std::sync::Arc;

use puzzle::rules::can_unlock;
use puzzle::{Category, Clock, PlayerProgress};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::persistence::{
    ClaimOutcome, DailyRewardRepository, DailyRewardStatus, GameRepository, PersistenceError,
    UnlockOutcome,
};
use crate::rewards::{AdOutcome, RewardKind};

/// Multiplier applied when the player watched an ad to double the reward.
pub const DOUBLED_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCard {
    pub category: Category,
    pub completion_percent: u8,
    pub can_unlock: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeState {
    pub progress: PlayerProgress,
    pub categories: Vec<CategoryCard>,
    pub daily: Option<DailyRewardStatus>,
    pub is_loading: bool,
    pub info_message: Option<String>,
    pub error_message: Option<String>,
}

pub struct HomeViewModel<G, D> {
    game: Arc<G>,
    daily: Arc<D>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<HomeState>,
}

impl<G: GameRepository, D: DailyRewardRepository> HomeViewModel<G, D> {
    pub fn new(game: Arc<G>, daily: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(HomeState::default());
        Self {
            game,
            daily,
            clock,
            state,
        }
    }

    pub fn state(&self) -> HomeState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HomeState> {
        self.state.subscribe()
    }

    async fn load(&self) -> Result<HomeState, PersistenceError> {
        let progress = self.game.progress().await?;
        let categories = self
            .game
            .categories()
            .await?
            .into_iter()
            .map(|category| CategoryCard {
                completion_percent: category.completion_percent(),
                can_unlock: !category.is_unlocked && can_unlock(&category, &progress),
                category,
            })
            .collect();
        let daily = self.daily.status(self.clock.today()).await?;
        Ok(HomeState {
            progress,
            categories,
            daily: Some(daily),
            ..HomeState::default()
        })
    }

    /// Reload everything, keeping the given messages on the new state.
    async fn reload(&self, info_message: Option<String>) -> HomeState {
        self.state.send_modify(|s| s.is_loading = true);
        let next = match self.load().await {
            Ok(loaded) => HomeState {
                info_message,
                ..loaded
            },
            Err(e) => {
                warn!("Failed to load home screen: {e}");
                HomeState {
                    is_loading: false,
                    error_message: Some(e.to_string()),
                    ..self.state()
                }
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    fn fail(&self, e: PersistenceError) -> HomeState {
        warn!("Home intent failed: {e}");
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.error_message = Some(e.to_string());
        });
        self.state()
    }

    pub async fn refresh(&self) -> HomeState {
        self.reload(None).await
    }

    pub async fn unlock_category(&self, category_id: i64) -> HomeState {
        let message = match self.game.unlock_category(category_id).await {
            Ok(UnlockOutcome::Unlocked { .. }) => {
                info!(category_id, "Category unlocked");
                "Category unlocked".to_string()
            }
            Ok(UnlockOutcome::AlreadyUnlocked) => "Category is already unlocked".to_string(),
            Ok(UnlockOutcome::Insufficient(shortfall)) => format!("Not enough {shortfall}"),
            Ok(UnlockOutcome::NotFound) => format!("Category {category_id} does not exist"),
            Err(e) => return self.fail(e),
        };
        self.reload(Some(message)).await
    }

    pub async fn claim_daily_reward(&self, doubled: bool) -> HomeState {
        let multiplier = if doubled { DOUBLED_MULTIPLIER } else { 1.0 };
        let message = match self.daily.claim(self.clock.today(), multiplier).await {
            Ok(ClaimOutcome::Claimed(receipt)) => format!(
                "Day {} reward: +{} {}",
                receipt.reward.day,
                receipt.claim.claimed_amount,
                receipt.reward.reward_type.currency()
            ),
            Ok(ClaimOutcome::AlreadyClaimed) => "Daily reward already claimed today".to_string(),
            Ok(ClaimOutcome::NoRewardForDay(day)) => format!("No reward configured for day {day}"),
            Err(e) => return self.fail(e),
        };
        self.reload(Some(message)).await
    }

    pub async fn on_ad_result(&self, outcome: AdOutcome) -> HomeState {
        let message = match outcome {
            AdOutcome::Closed => "Ad closed before the reward was earned".to_string(),
            AdOutcome::Rewarded(reward) => match reward.kind {
                RewardKind::Currency(currency) => {
                    if let Err(e) = self.game.grant_reward(currency, reward.amount).await {
                        return self.fail(e);
                    }
                    format!("+{} {currency}", reward.amount)
                }
                RewardKind::Lives => "Lives can only be refilled inside a level".to_string(),
            },
        };
        self.reload(Some(message)).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use puzzle::ManualClock;

    use super::*;
    use crate::persistence::sqlite::{
        Database, SqliteDailyRewardRepository, SqliteGameRepository,
    };
    use crate::rewards::Reward;

    type Home = HomeViewModel<SqliteGameRepository, SqliteDailyRewardRepository>;

    fn millis(date: NaiveDate) -> i64 {
        date.and_hms_opt(12, 0, 0).unwrap().and_utc().timestamp_millis()
    }

    async fn setup() -> (Database, Arc<ManualClock>, Home) {
        let db = Database::new_in_memory().await.unwrap();
        let clock = Arc::new(ManualClock::new(millis(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )));
        let home = HomeViewModel::new(
            Arc::new(SqliteGameRepository::with_seed(db.pool().clone(), 1)),
            Arc::new(SqliteDailyRewardRepository::new(db.pool().clone())),
            clock.clone(),
        );
        (db, clock, home)
    }

    #[tokio::test]
    async fn test_refresh_builds_cards() {
        let (_db, _clock, home) = setup().await;
        let state = home.refresh().await;

        assert!(!state.is_loading);
        assert_eq!(state.progress.total_coins, 100);
        let first = &state.categories[0];
        assert!(first.category.is_unlocked);
        assert_eq!(first.completion_percent, 0);
        assert!(!first.can_unlock);
        let animals = &state.categories[1];
        assert_eq!(animals.category.name, "Animals");
        assert!(!animals.can_unlock);

        let daily = state.daily.unwrap();
        assert!(daily.can_claim);
        assert_eq!(daily.cycle_day, 1);
    }

    #[tokio::test]
    async fn test_unlock_without_stars_reports_shortfall() {
        let (_db, _clock, home) = setup().await;
        let state = home.unlock_category(2).await;

        let message = state.info_message.unwrap();
        assert!(message.starts_with("Not enough"), "{message}");
        assert!(message.contains("stars"));
        assert!(!state.categories[1].category.is_unlocked);
        assert_eq!(state.progress.total_coins, 100);
    }

    #[tokio::test]
    async fn test_claim_once_per_day() {
        let (_db, clock, home) = setup().await;
        let mut rx = home.subscribe();

        let state = home.claim_daily_reward(false).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(state.progress.total_coins, 150);
        assert!(!state.daily.as_ref().unwrap().can_claim);

        let state = home.claim_daily_reward(false).await;
        assert_eq!(
            state.info_message.as_deref(),
            Some("Daily reward already claimed today")
        );
        assert_eq!(state.progress.total_coins, 150);

        clock.advance_secs(24 * 60 * 60);
        let state = home.refresh().await;
        let daily = state.daily.unwrap();
        assert!(daily.can_claim);
        assert_eq!(daily.cycle_day, 2);
    }

    #[tokio::test]
    async fn test_doubled_claim() {
        let (_db, _clock, home) = setup().await;
        let state = home.claim_daily_reward(true).await;
        assert_eq!(state.progress.total_coins, 200);
        assert!(state.info_message.unwrap().contains("+100"));
    }

    #[tokio::test]
    async fn test_ad_rewards_coins() {
        let (_db, _clock, home) = setup().await;
        let state = home.on_ad_result(AdOutcome::Rewarded(Reward::coins(25))).await;
        assert_eq!(state.progress.total_coins, 125);

        let state = home.on_ad_result(AdOutcome::Closed).await;
        assert_eq!(state.progress.total_coins, 125);
        assert!(state.info_message.is_some());
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        let (db, _clock, home) = setup().await;
        home.refresh().await;
        db.pool().close().await;

        let state = home.refresh().await;
        assert!(state.error_message.is_some());
        assert!(!state.is_loading);
        assert_eq!(state.categories.len(), 7);
    }
}
