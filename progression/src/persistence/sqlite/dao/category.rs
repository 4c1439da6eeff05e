use puzzle::Category;
use sqlx::SqliteConnection;

use super::super::helpers::{decode_category_type, encode_category_type, to_u32};
use crate::persistence::PersistenceError;

/// Row type for category queries. The level counters come from the
/// `category_stats` cache.
#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    category_type: String,
    name: String,
    description: String,
    icon: String,
    required_stars: i64,
    required_coins: i64,
    required_vip_points: i64,
    is_vip_category: bool,
    is_daily_category: bool,
    is_unlocked: bool,
    sort_order: i64,
    total_levels: i64,
    completed_levels: i64,
}

impl CategoryRow {
    fn into_category(self) -> Result<Category, PersistenceError> {
        Ok(Category {
            id: self.id,
            category_type: decode_category_type(&self.category_type)?,
            name: self.name,
            description: self.description,
            icon: self.icon,
            required_stars: self.required_stars,
            required_coins: self.required_coins,
            required_vip_points: self.required_vip_points,
            is_vip_category: self.is_vip_category,
            is_daily_category: self.is_daily_category,
            is_unlocked: self.is_unlocked,
            sort_order: self.sort_order,
            total_levels: to_u32(self.total_levels, "total_levels")?,
            completed_levels: to_u32(self.completed_levels, "completed_levels")?,
        })
    }
}

const SELECT_CATEGORY: &str = r#"
    SELECT c.id, c.category_type, c.name, c.description, c.icon,
           c.required_stars, c.required_coins, c.required_vip_points,
           c.is_vip_category, c.is_daily_category, c.is_unlocked, c.sort_order,
           COALESCE(s.total_levels, 0) AS total_levels,
           COALESCE(s.completed_levels, 0) AS completed_levels
    FROM categories c
    LEFT JOIN category_stats s ON s.category_id = c.id
"#;

/// Queries over the `categories` table.
pub struct CategoryDao;

impl CategoryDao {
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Category>, PersistenceError> {
        let sql = format!("{SELECT_CATEGORY} ORDER BY c.sort_order, c.id");
        let rows: Vec<CategoryRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;
        rows.into_iter().map(CategoryRow::into_category).collect()
    }

    pub async fn find(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Category>, PersistenceError> {
        let sql = format!("{SELECT_CATEGORY} WHERE c.id = ?");
        let row: Option<CategoryRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        row.map(CategoryRow::into_category).transpose()
    }

    pub async fn count(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.0)
    }

    pub async fn insert(
        conn: &mut SqliteConnection,
        category: &Category,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO categories
                (id, category_type, name, description, icon,
                 required_stars, required_coins, required_vip_points,
                 is_vip_category, is_daily_category, is_unlocked, sort_order)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(category.id)
        .bind(encode_category_type(category.category_type))
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.icon)
        .bind(category.required_stars)
        .bind(category.required_coins)
        .bind(category.required_vip_points)
        .bind(category.is_vip_category)
        .bind(category.is_daily_category)
        .bind(category.is_unlocked)
        .bind(category.sort_order)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Returns false when no category has this id.
    pub async fn set_unlocked(
        conn: &mut SqliteConnection,
        id: i64,
        unlocked: bool,
    ) -> Result<bool, PersistenceError> {
        let result = sqlx::query("UPDATE categories SET is_unlocked = ? WHERE id = ?")
            .bind(unlocked)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
