//! SQLite-backed repository implementations.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode**: one writer and multiple concurrent readers.
//! - **Foreign keys enabled**: enforced at the connection level, so deleting a
//!   level cascades to its in-progress state.
//! - **Embedded migrations**: `sqlx::migrate!` runs `migrations/*.sql` when
//!   [`Database::open`] is called. A stored schema this build does not know is
//!   dropped and recreated.
//! - **Seeding**: the embedded catalog is inserted once, on the first open.
//!
//! ## Repository types
//!
//! | Type | Trait |
//! |------|-------|
//! | [`SqliteGameRepository`] | `GameRepository` |
//! | [`SqliteDailyRewardRepository`] | `DailyRewardRepository` |
//!
//! Repositories compose the per-table DAOs in [`dao`]; every multi-step
//! workflow runs inside a single transaction.

mod daily_reward_repo;
pub mod dao;
mod database;
mod game_repo;
pub(crate) mod helpers;
#[cfg(test)]
mod integration_tests;
mod seed;

pub use daily_reward_repo::SqliteDailyRewardRepository;
pub use database::Database;
pub use game_repo::SqliteGameRepository;
pub use seed::{seed_catalog, SeedReport};
