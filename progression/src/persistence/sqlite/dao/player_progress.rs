use puzzle::{Currency, PlayerProgress, UnlockCost};
use sqlx::SqliteConnection;

use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct ProgressRow {
    id: i64,
    total_stars: i64,
    total_coins: i64,
    vip_points: i64,
    current_level_id: Option<i64>,
    total_completed_levels: i64,
    total_play_time: i64,
    hints_used: i64,
    perfect_levels: i64,
    last_played: Option<i64>,
}

impl From<ProgressRow> for PlayerProgress {
    fn from(r: ProgressRow) -> Self {
        Self {
            id: r.id,
            total_stars: r.total_stars,
            total_coins: r.total_coins,
            vip_points: r.vip_points,
            current_level_id: r.current_level_id,
            total_completed_levels: r.total_completed_levels,
            total_play_time: r.total_play_time,
            hints_used: r.hints_used,
            perfect_levels: r.perfect_levels,
            last_played: r.last_played,
        }
    }
}

/// Queries over the singleton `player_progress` row. Every write first makes
/// sure the row exists, so callers never see a missing wallet.
pub struct PlayerProgressDao;

impl PlayerProgressDao {
    async fn ensure(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
        // Column defaults carry the first-launch wallet.
        sqlx::query("INSERT OR IGNORE INTO player_progress (id) VALUES (1)")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn get_or_create(
        conn: &mut SqliteConnection,
    ) -> Result<PlayerProgress, PersistenceError> {
        Self::ensure(conn).await?;
        let row: ProgressRow = sqlx::query_as(
            r#"
            SELECT id, total_stars, total_coins, vip_points, current_level_id,
                   total_completed_levels, total_play_time, hints_used,
                   perfect_levels, last_played
            FROM player_progress
            WHERE id = 1
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.into())
    }

    pub async fn add_currency(
        conn: &mut SqliteConnection,
        currency: Currency,
        amount: i64,
    ) -> Result<(), PersistenceError> {
        Self::ensure(conn).await?;
        let sql = match currency {
            Currency::Coins => "UPDATE player_progress SET total_coins = total_coins + ? WHERE id = 1",
            Currency::Stars => "UPDATE player_progress SET total_stars = total_stars + ? WHERE id = 1",
            Currency::VipPoints => "UPDATE player_progress SET vip_points = vip_points + ? WHERE id = 1",
        };
        sqlx::query(sql).bind(amount).execute(&mut *conn).await?;
        Ok(())
    }

    /// Spend coins only if the balance covers it. Returns false otherwise.
    pub async fn spend_coins(
        conn: &mut SqliteConnection,
        amount: i64,
    ) -> Result<bool, PersistenceError> {
        Self::ensure(conn).await?;
        let result = sqlx::query(
            "UPDATE player_progress SET total_coins = total_coins - ? WHERE id = 1 AND total_coins >= ?",
        )
        .bind(amount)
        .bind(amount)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deduct an unlock cost, flooring every balance at zero.
    pub async fn deduct_floored(
        conn: &mut SqliteConnection,
        cost: UnlockCost,
    ) -> Result<(), PersistenceError> {
        Self::ensure(conn).await?;
        sqlx::query(
            r#"
            UPDATE player_progress
            SET total_stars = MAX(0, total_stars - ?),
                total_coins = MAX(0, total_coins - ?),
                vip_points  = MAX(0, vip_points - ?)
            WHERE id = 1
            "#,
        )
        .bind(cost.stars)
        .bind(cost.coins)
        .bind(cost.vip_points)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Credit the rewards of a solved level.
    pub async fn record_completion(
        conn: &mut SqliteConnection,
        stars: u32,
        coins: i64,
        play_time_secs: i64,
        perfect: bool,
        now: i64,
    ) -> Result<(), PersistenceError> {
        Self::ensure(conn).await?;
        sqlx::query(
            r#"
            UPDATE player_progress
            SET total_stars = total_stars + ?,
                total_coins = total_coins + ?,
                total_completed_levels = total_completed_levels + 1,
                total_play_time = total_play_time + ?,
                perfect_levels = perfect_levels + ?,
                last_played = ?
            WHERE id = 1
            "#,
        )
        .bind(stars as i64)
        .bind(coins)
        .bind(play_time_secs.max(0))
        .bind(if perfect { 1_i64 } else { 0 })
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn increment_hints_used(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
        Self::ensure(conn).await?;
        sqlx::query("UPDATE player_progress SET hints_used = hints_used + 1 WHERE id = 1")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn set_current_level(
        conn: &mut SqliteConnection,
        level_id: i64,
        now: i64,
    ) -> Result<(), PersistenceError> {
        Self::ensure(conn).await?;
        sqlx::query("UPDATE player_progress SET current_level_id = ?, last_played = ? WHERE id = 1")
            .bind(level_id)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
