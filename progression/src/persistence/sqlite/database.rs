//! SQLite database connection pool, migration runner and catalog seeding.

use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use super::seed::seed_catalog;
use crate::persistence::PersistenceError;

/// Holds a connection pool to the SQLite database.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at `path`, run migrations, seed the
    /// catalog on first launch, and return a ready-to-use `Database`.
    pub async fn open(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(PersistenceError::Io)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(sqlx::Error::from)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(sqlx::Error::from)?;

        let db = Self { pool };
        db.prepare().await?;
        info!(path = %path.display(), "Database ready");
        Ok(db)
    }

    /// Create a seeded in-memory database for testing.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(sqlx::Error::from)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(sqlx::Error::from)?;

        let db = Self { pool };
        db.prepare().await?;
        Ok(db)
    }

    async fn prepare(&self) -> Result<(), PersistenceError> {
        match self.run_migrations().await {
            Ok(()) => {}
            Err(MigrateError::VersionMissing(version) | MigrateError::VersionMismatch(version)) => {
                warn!(version, "Stored schema does not match this build; recreating database");
                self.reset_schema().await?;
                self.run_migrations()
                    .await
                    .map_err(|e| PersistenceError::Migration(e.to_string()))?;
            }
            Err(e) => return Err(PersistenceError::Migration(e.to_string())),
        }
        let report = seed_catalog(&self.pool).await?;
        if !report.skipped {
            info!(
                categories = report.categories,
                levels = report.levels,
                "Catalog seeded"
            );
        }
        Ok(())
    }

    /// Run embedded migrations from `progression/migrations/`.
    async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Drop every table, including the migration ledger.
    async fn reset_schema(&self) -> Result<(), PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&mut *conn)
        .await?;

        sqlx::query("PRAGMA foreign_keys = OFF").execute(&mut *conn).await?;
        for (name,) in &tables {
            let sql = format!("DROP TABLE IF EXISTS \"{}\"", name.replace('"', "\"\""));
            sqlx::query(&sql).execute(&mut *conn).await?;
        }
        sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
        info!(dropped = tables.len(), "Schema reset");
        Ok(())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
