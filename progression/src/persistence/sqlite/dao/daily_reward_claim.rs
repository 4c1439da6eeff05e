use chrono::NaiveDate;
use puzzle::DailyRewardClaim;
use sqlx::SqliteConnection;

use super::super::helpers::to_u32;
use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct ClaimRow {
    id: i64,
    reward_id: i64,
    claim_date: NaiveDate,
    day_streak: i64,
    claimed_amount: i64,
    bonus_multiplier: f64,
}

impl ClaimRow {
    fn into_claim(self) -> Result<DailyRewardClaim, PersistenceError> {
        Ok(DailyRewardClaim {
            id: self.id,
            reward_id: self.reward_id,
            claim_date: self.claim_date,
            day_streak: to_u32(self.day_streak, "day_streak")?,
            claimed_amount: self.claimed_amount,
            bonus_multiplier: self.bonus_multiplier,
        })
    }
}

/// Append-only log of daily reward claims.
pub struct DailyRewardClaimDao;

impl DailyRewardClaimDao {
    /// Insert a claim and return its id. `claim.id` is ignored.
    pub async fn insert(
        conn: &mut SqliteConnection,
        claim: &DailyRewardClaim,
    ) -> Result<i64, PersistenceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_reward_claims
                (reward_id, claim_date, day_streak, claimed_amount, bonus_multiplier)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(claim.reward_id)
        .bind(claim.claim_date)
        .bind(claim.day_streak as i64)
        .bind(claim.claimed_amount)
        .bind(claim.bonus_multiplier)
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn exists_on(
        conn: &mut SqliteConnection,
        date: NaiveDate,
    ) -> Result<bool, PersistenceError> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM daily_reward_claims WHERE claim_date = ?")
                .bind(date)
                .fetch_one(&mut *conn)
                .await?;
        Ok(row.0 > 0)
    }

    /// Every claim, newest first.
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<DailyRewardClaim>, PersistenceError> {
        let rows: Vec<ClaimRow> = sqlx::query_as(
            r#"
            SELECT id, reward_id, claim_date, day_streak, claimed_amount, bonus_multiplier
            FROM daily_reward_claims
            ORDER BY claim_date DESC, id DESC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;
        rows.into_iter().map(ClaimRow::into_claim).collect()
    }
}
