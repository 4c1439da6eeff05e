use puzzle::CategoryStats;
use sqlx::SqliteConnection;

use super::super::helpers::to_u32;
use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct CategoryStatsRow {
    category_id: i64,
    completed_levels: i64,
    total_levels: i64,
    stars_earned: i64,
    best_time: Option<i64>,
    last_played_level: Option<i64>,
}

impl CategoryStatsRow {
    fn into_stats(self) -> Result<CategoryStats, PersistenceError> {
        Ok(CategoryStats {
            category_id: self.category_id,
            completed_levels: to_u32(self.completed_levels, "completed_levels")?,
            total_levels: to_u32(self.total_levels, "total_levels")?,
            stars_earned: self.stars_earned,
            best_time: self.best_time,
            last_played_level: self
                .last_played_level
                .map(|n| to_u32(n, "last_played_level"))
                .transpose()?,
        })
    }
}

/// Queries over `category_stats`.
///
/// The table is a cache of aggregates over `game_levels`. It is only ever
/// written by [`CategoryStatsDao::refresh`], which recomputes it from the
/// source rows; call it in the same transaction as any change to level
/// completion.
pub struct CategoryStatsDao;

impl CategoryStatsDao {
    pub async fn find(
        conn: &mut SqliteConnection,
        category_id: i64,
    ) -> Result<Option<CategoryStats>, PersistenceError> {
        let row: Option<CategoryStatsRow> = sqlx::query_as(
            r#"
            SELECT category_id, completed_levels, total_levels, stars_earned,
                   best_time, last_played_level
            FROM category_stats
            WHERE category_id = ?
            "#,
        )
        .bind(category_id)
        .fetch_optional(&mut *conn)
        .await?;
        row.map(CategoryStatsRow::into_stats).transpose()
    }

    /// Recompute the cached aggregates for one category. `last_played_level`
    /// replaces the stored value only when given.
    pub async fn refresh(
        conn: &mut SqliteConnection,
        category_id: i64,
        last_played_level: Option<u32>,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO category_stats
                (category_id, completed_levels, total_levels, stars_earned,
                 best_time, last_played_level)
            SELECT ?,
                   COALESCE(SUM(is_completed), 0),
                   COUNT(*),
                   COALESCE(SUM(stars_earned), 0),
                   MIN(completion_time),
                   ?
            FROM game_levels
            WHERE category_id = ?
            ON CONFLICT(category_id) DO UPDATE SET
                completed_levels  = excluded.completed_levels,
                total_levels      = excluded.total_levels,
                stars_earned      = excluded.stars_earned,
                best_time         = excluded.best_time,
                last_played_level = COALESCE(excluded.last_played_level, category_stats.last_played_level)
            "#,
        )
        .bind(category_id)
        .bind(last_played_level.map(|n| n as i64))
        .bind(category_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
