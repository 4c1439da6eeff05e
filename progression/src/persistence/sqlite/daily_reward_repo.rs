//! SQLite-backed repository for the daily login reward cycle.

use chrono::NaiveDate;
use puzzle::daily::{
    apply_streak_check, claimed_amount, cycle_day, effective_multiplier, evaluate_streak,
    record_claim,
};
use puzzle::{Currency, DailyReward, DailyRewardClaim, DailyRewardStats};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::dao::{DailyRewardClaimDao, DailyRewardDao, DailyRewardStatsDao, PlayerProgressDao};
use crate::persistence::outcomes::{ClaimOutcome, DailyClaimReceipt, DailyRewardStatus};
use crate::persistence::traits::DailyRewardRepository;
use crate::persistence::PersistenceError;

/// SQLite implementation of [`DailyRewardRepository`].
pub struct SqliteDailyRewardRepository {
    pool: SqlitePool,
}

impl SqliteDailyRewardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Load the stats and break the streak if a day was skipped, persisting the
/// change.
async fn load_evaluated_stats(
    conn: &mut SqliteConnection,
    today: NaiveDate,
) -> Result<DailyRewardStats, PersistenceError> {
    let mut stats = DailyRewardStatsDao::get_or_create(&mut *conn).await?;
    let check = evaluate_streak(&stats, today);
    if check.streak_broken {
        apply_streak_check(&mut stats, check);
        DailyRewardStatsDao::save(&mut *conn, &stats).await?;
        info!(missed_days = check.missed_days, "Daily streak broken");
    }
    Ok(stats)
}

impl DailyRewardRepository for SqliteDailyRewardRepository {
    async fn rewards(&self) -> Result<Vec<DailyReward>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        DailyRewardDao::list_active(&mut *conn).await
    }

    async fn claims(&self) -> Result<Vec<DailyRewardClaim>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        DailyRewardClaimDao::list(&mut *conn).await
    }

    async fn stats(&self) -> Result<DailyRewardStats, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        DailyRewardStatsDao::get_or_create(&mut *conn).await
    }

    async fn status(&self, today: NaiveDate) -> Result<DailyRewardStatus, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let stats = load_evaluated_stats(&mut *tx, today).await?;
        let can_claim = !DailyRewardClaimDao::exists_on(&mut *tx, today).await?;
        let day = cycle_day(stats.current_streak);
        let reward = DailyRewardDao::find_by_day(&mut *tx, day).await?;

        tx.commit().await?;
        Ok(DailyRewardStatus {
            can_claim,
            cycle_day: day,
            reward,
            stats,
        })
    }

    async fn claim(&self, today: NaiveDate, multiplier: f64) -> Result<ClaimOutcome, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        if DailyRewardClaimDao::exists_on(&mut *tx, today).await? {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }

        let mut stats = load_evaluated_stats(&mut *tx, today).await?;
        let day = cycle_day(stats.current_streak);
        let Some(reward) = DailyRewardDao::find_by_day(&mut *tx, day).await? else {
            return Ok(ClaimOutcome::NoRewardForDay(day));
        };

        let multiplier = effective_multiplier(multiplier);
        let amount = claimed_amount(reward.amount, multiplier);
        let mut claim = DailyRewardClaim {
            id: 0,
            reward_id: reward.id,
            claim_date: today,
            day_streak: stats.current_streak + 1,
            claimed_amount: amount,
            bonus_multiplier: multiplier,
        };
        claim.id = DailyRewardClaimDao::insert(&mut *tx, &claim).await?;

        let currency = reward.reward_type.currency();
        PlayerProgressDao::add_currency(&mut *tx, currency, amount).await?;
        match currency {
            Currency::Coins => stats.total_coins_earned += amount,
            Currency::Stars => stats.total_stars_earned += amount,
            Currency::VipPoints => stats.total_vip_points_earned += amount,
        }
        record_claim(&mut stats, today);
        DailyRewardStatsDao::save(&mut *tx, &stats).await?;
        let progress = PlayerProgressDao::get_or_create(&mut *tx).await?;

        tx.commit().await?;

        info!(
            day,
            reward_type = reward.reward_type.as_str(),
            amount,
            streak = stats.current_streak,
            "Daily reward claimed"
        );
        Ok(ClaimOutcome::Claimed(DailyClaimReceipt {
            claim,
            reward,
            stats,
            progress,
        }))
    }
}
