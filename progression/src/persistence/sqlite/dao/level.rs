use puzzle::Level;
use sqlx::SqliteConnection;

use super::super::helpers::{decode_letters, encode_letters, to_u32};
use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct LevelRow {
    id: i64,
    category_id: i64,
    level_number: i64,
    question: String,
    image: Option<String>,
    answer: String,
    available_letters: String,
    answer_length: i64,
    max_lives: i64,
    hint_cost: i64,
    stars_reward: i64,
    coins_reward: i64,
    is_unlocked: bool,
    is_completed: bool,
    stars_earned: i64,
    completion_time: Option<i64>,
}

impl LevelRow {
    fn into_level(self) -> Result<Level, PersistenceError> {
        Ok(Level {
            id: self.id,
            category_id: self.category_id,
            level_number: to_u32(self.level_number, "level_number")?,
            question: self.question,
            image: self.image,
            answer: self.answer,
            available_letters: decode_letters(&self.available_letters)?,
            answer_length: to_u32(self.answer_length, "answer_length")?,
            max_lives: to_u32(self.max_lives, "max_lives")?,
            hint_cost: self.hint_cost,
            stars_reward: to_u32(self.stars_reward, "stars_reward")?,
            coins_reward: self.coins_reward,
            is_unlocked: self.is_unlocked,
            is_completed: self.is_completed,
            stars_earned: to_u32(self.stars_earned, "stars_earned")?,
            completion_time: self.completion_time,
        })
    }
}

const SELECT_LEVEL: &str = r#"
    SELECT id, category_id, level_number, question, image, answer,
           available_letters, answer_length, max_lives, hint_cost,
           stars_reward, coins_reward, is_unlocked, is_completed,
           stars_earned, completion_time
    FROM game_levels
"#;

/// Queries over the `game_levels` table.
pub struct LevelDao;

impl LevelDao {
    pub async fn find(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Level>, PersistenceError> {
        let sql = format!("{SELECT_LEVEL} WHERE id = ?");
        let row: Option<LevelRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        row.map(LevelRow::into_level).transpose()
    }

    pub async fn find_by_number(
        conn: &mut SqliteConnection,
        category_id: i64,
        level_number: u32,
    ) -> Result<Option<Level>, PersistenceError> {
        let sql = format!("{SELECT_LEVEL} WHERE category_id = ? AND level_number = ?");
        let row: Option<LevelRow> = sqlx::query_as(&sql)
            .bind(category_id)
            .bind(level_number as i64)
            .fetch_optional(&mut *conn)
            .await?;
        row.map(LevelRow::into_level).transpose()
    }

    pub async fn list_by_category(
        conn: &mut SqliteConnection,
        category_id: i64,
    ) -> Result<Vec<Level>, PersistenceError> {
        let sql = format!("{SELECT_LEVEL} WHERE category_id = ? ORDER BY level_number");
        let rows: Vec<LevelRow> = sqlx::query_as(&sql)
            .bind(category_id)
            .fetch_all(&mut *conn)
            .await?;
        rows.into_iter().map(LevelRow::into_level).collect()
    }

    /// Insert a level and return its assigned id. `level.id` is ignored.
    pub async fn insert(conn: &mut SqliteConnection, level: &Level) -> Result<i64, PersistenceError> {
        let letters = encode_letters(&level.available_letters)?;
        let result = sqlx::query(
            r#"
            INSERT INTO game_levels
                (category_id, level_number, question, image, answer,
                 available_letters, answer_length, max_lives, hint_cost,
                 stars_reward, coins_reward, is_unlocked, is_completed,
                 stars_earned, completion_time)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(level.category_id)
        .bind(level.level_number as i64)
        .bind(&level.question)
        .bind(&level.image)
        .bind(&level.answer)
        .bind(letters)
        .bind(level.answer_length as i64)
        .bind(level.max_lives as i64)
        .bind(level.hint_cost)
        .bind(level.stars_reward as i64)
        .bind(level.coins_reward)
        .bind(level.is_unlocked)
        .bind(level.is_completed)
        .bind(level.stars_earned as i64)
        .bind(level.completion_time)
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Mark a level solved, keeping the best stars and the fastest time seen.
    pub async fn mark_completed(
        conn: &mut SqliteConnection,
        id: i64,
        stars_earned: u32,
        completion_time: i64,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            UPDATE game_levels
            SET is_completed = 1,
                stars_earned = MAX(stars_earned, ?),
                completion_time = CASE
                    WHEN completion_time IS NULL OR completion_time > ? THEN ?
                    ELSE completion_time
                END
            WHERE id = ?
            "#,
        )
        .bind(stars_earned as i64)
        .bind(completion_time)
        .bind(completion_time)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn unlock(conn: &mut SqliteConnection, id: i64) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE game_levels SET is_unlocked = 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
