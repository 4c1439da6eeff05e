use puzzle::DailyReward;
use sqlx::SqliteConnection;

use super::super::helpers::{decode_reward_type, encode_reward_type, to_u32};
use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct DailyRewardRow {
    id: i64,
    day: i64,
    reward_type: String,
    amount: i64,
    icon: String,
    is_special_reward: bool,
    is_active: bool,
}

impl DailyRewardRow {
    fn into_reward(self) -> Result<DailyReward, PersistenceError> {
        Ok(DailyReward {
            id: self.id,
            day: to_u32(self.day, "day")?,
            reward_type: decode_reward_type(&self.reward_type)?,
            amount: self.amount,
            icon: self.icon,
            is_special_reward: self.is_special_reward,
            is_active: self.is_active,
        })
    }
}

const SELECT_REWARD: &str = r#"
    SELECT id, day, reward_type, amount, icon, is_special_reward, is_active
    FROM daily_reward
"#;

/// Queries over the seven-day `daily_reward` catalog.
pub struct DailyRewardDao;

impl DailyRewardDao {
    pub async fn list_active(
        conn: &mut SqliteConnection,
    ) -> Result<Vec<DailyReward>, PersistenceError> {
        let sql = format!("{SELECT_REWARD} WHERE is_active = 1 ORDER BY day");
        let rows: Vec<DailyRewardRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;
        rows.into_iter().map(DailyRewardRow::into_reward).collect()
    }

    pub async fn find_by_day(
        conn: &mut SqliteConnection,
        day: u32,
    ) -> Result<Option<DailyReward>, PersistenceError> {
        let sql = format!("{SELECT_REWARD} WHERE day = ? AND is_active = 1");
        let row: Option<DailyRewardRow> = sqlx::query_as(&sql)
            .bind(day as i64)
            .fetch_optional(&mut *conn)
            .await?;
        row.map(DailyRewardRow::into_reward).transpose()
    }

    pub async fn insert(
        conn: &mut SqliteConnection,
        reward: &DailyReward,
    ) -> Result<i64, PersistenceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_reward (day, reward_type, amount, icon, is_special_reward, is_active)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reward.day as i64)
        .bind(encode_reward_type(reward.reward_type))
        .bind(reward.amount)
        .bind(&reward.icon)
        .bind(reward.is_special_reward)
        .bind(reward.is_active)
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn count(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM daily_reward")
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.0)
    }
}
