use chrono::NaiveDate;
use puzzle::DailyRewardStats;
use sqlx::SqliteConnection;

use super::super::helpers::to_u32;
use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct StatsRow {
    id: i64,
    current_streak: i64,
    longest_streak: i64,
    total_claims: i64,
    last_claim_date: Option<NaiveDate>,
    next_reset_date: Option<NaiveDate>,
    total_coins_earned: i64,
    total_stars_earned: i64,
    total_vip_points_earned: i64,
    missed_days: i64,
}

impl StatsRow {
    fn into_stats(self) -> Result<DailyRewardStats, PersistenceError> {
        Ok(DailyRewardStats {
            id: self.id,
            current_streak: to_u32(self.current_streak, "current_streak")?,
            longest_streak: to_u32(self.longest_streak, "longest_streak")?,
            total_claims: self.total_claims,
            last_claim_date: self.last_claim_date,
            next_reset_date: self.next_reset_date,
            total_coins_earned: self.total_coins_earned,
            total_stars_earned: self.total_stars_earned,
            total_vip_points_earned: self.total_vip_points_earned,
            missed_days: self.missed_days,
        })
    }
}

/// Queries over the singleton `daily_reward_stats` row.
pub struct DailyRewardStatsDao;

impl DailyRewardStatsDao {
    pub async fn get_or_create(
        conn: &mut SqliteConnection,
    ) -> Result<DailyRewardStats, PersistenceError> {
        sqlx::query("INSERT OR IGNORE INTO daily_reward_stats (id) VALUES (1)")
            .execute(&mut *conn)
            .await?;
        let row: StatsRow = sqlx::query_as(
            r#"
            SELECT id, current_streak, longest_streak, total_claims,
                   last_claim_date, next_reset_date, total_coins_earned,
                   total_stars_earned, total_vip_points_earned, missed_days
            FROM daily_reward_stats
            WHERE id = 1
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;
        row.into_stats()
    }

    pub async fn save(
        conn: &mut SqliteConnection,
        stats: &DailyRewardStats,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO daily_reward_stats
                (id, current_streak, longest_streak, total_claims,
                 last_claim_date, next_reset_date, total_coins_earned,
                 total_stars_earned, total_vip_points_earned, missed_days)
            VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(stats.current_streak as i64)
        .bind(stats.longest_streak as i64)
        .bind(stats.total_claims)
        .bind(stats.last_claim_date)
        .bind(stats.next_reset_date)
        .bind(stats.total_coins_earned)
        .bind(stats.total_stars_earned)
        .bind(stats.total_vip_points_earned)
        .bind(stats.missed_days)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
