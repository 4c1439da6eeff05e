use puzzle::LevelGameState;
use sqlx::SqliteConnection;

use super::super::helpers::{decode_tiles, encode_tiles, to_u32};
use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct LevelStateRow {
    level_id: i64,
    current_lives: i64,
    used_tiles: String,
    removed_tiles: String,
    hints_used_count: i64,
    start_time: i64,
    pause_time: Option<i64>,
    is_paused: bool,
    lives_depleted_at: Option<i64>,
}

impl LevelStateRow {
    fn into_state(self) -> Result<LevelGameState, PersistenceError> {
        Ok(LevelGameState {
            level_id: self.level_id,
            current_lives: to_u32(self.current_lives, "current_lives")?,
            used_tiles: decode_tiles(&self.used_tiles)?,
            removed_tiles: decode_tiles(&self.removed_tiles)?,
            hints_used_count: to_u32(self.hints_used_count, "hints_used_count")?,
            start_time: self.start_time,
            pause_time: self.pause_time,
            is_paused: self.is_paused,
            lives_depleted_at: self.lives_depleted_at,
        })
    }
}

/// Queries over `level_game_states`: one row per level attempt in progress.
pub struct LevelStateDao;

impl LevelStateDao {
    pub async fn find(
        conn: &mut SqliteConnection,
        level_id: i64,
    ) -> Result<Option<LevelGameState>, PersistenceError> {
        let row: Option<LevelStateRow> = sqlx::query_as(
            r#"
            SELECT level_id, current_lives, used_tiles, removed_tiles,
                   hints_used_count, start_time, pause_time, is_paused,
                   lives_depleted_at
            FROM level_game_states
            WHERE level_id = ?
            "#,
        )
        .bind(level_id)
        .fetch_optional(&mut *conn)
        .await?;
        row.map(LevelStateRow::into_state).transpose()
    }

    pub async fn upsert(
        conn: &mut SqliteConnection,
        state: &LevelGameState,
    ) -> Result<(), PersistenceError> {
        let used = encode_tiles(&state.used_tiles)?;
        let removed = encode_tiles(&state.removed_tiles)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO level_game_states
                (level_id, current_lives, used_tiles, removed_tiles,
                 hints_used_count, start_time, pause_time, is_paused,
                 lives_depleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(state.level_id)
        .bind(state.current_lives as i64)
        .bind(used)
        .bind(removed)
        .bind(state.hints_used_count as i64)
        .bind(state.start_time)
        .bind(state.pause_time)
        .bind(state.is_paused)
        .bind(state.lives_depleted_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn delete(conn: &mut SqliteConnection, level_id: i64) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM level_game_states WHERE level_id = ?")
            .bind(level_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
