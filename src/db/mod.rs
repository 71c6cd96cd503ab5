//! Database layer
//!
//! Persistence for users, snippets, commentaries, favourites and sessions.
//! Two backends are supported:
//! - SQLite (default, single file next to the binary)
//! - MySQL
//!
//! The driver is picked from [`crate::config::DatabaseConfig`]. Repositories
//! hold a [`DynDatabasePool`] and dispatch on its driver.
//!
//! ```ignore
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, is_unique_violation, mysql, sqlite, DatabasePool,
    DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
