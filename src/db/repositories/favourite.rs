//! Favourite repository
//!
//! A favourite is a single `(user_id, snippet_id)` row; the composite primary
//! key makes a second insert for the same pair a unique-constraint violation.

use crate::config::DatabaseDriver;
use crate::db::{mysql, sqlite, DynDatabasePool};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Favourite repository trait
#[async_trait]
pub trait FavouriteRepository: Send + Sync {
    /// Check whether the user has favourited the snippet
    async fn exists(&self, user_id: i64, snippet_id: i64) -> Result<bool>;

    /// Record a favourite.
    ///
    /// Returns `false` when the snippet does not exist.
    async fn insert(&self, user_id: i64, snippet_id: i64) -> Result<bool>;

    /// Delete a favourite, returning whether a row was removed
    async fn delete(&self, user_id: i64, snippet_id: i64) -> Result<bool>;
}

/// SQLx-based favourite repository implementation
pub struct SqlxFavouriteRepository {
    pool: DynDatabasePool,
}

impl SqlxFavouriteRepository {
    /// Create a new SQLx favourite repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FavouriteRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FavouriteRepository for SqlxFavouriteRepository {
    async fn exists(&self, user_id: i64, snippet_id: i64) -> Result<bool> {
        let sql = "SELECT COUNT(*) FROM favourites WHERE user_id = ? AND snippet_id = ?";
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar(sql)
                    .bind(user_id)
                    .bind(snippet_id)
                    .fetch_one(sqlite(&self.pool)?)
                    .await
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar(sql)
                    .bind(user_id)
                    .bind(snippet_id)
                    .fetch_one(mysql(&self.pool)?)
                    .await
            }
        }
        .context("Failed to check favourite")?;

        Ok(count > 0)
    }

    async fn insert(&self, user_id: i64, snippet_id: i64) -> Result<bool> {
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(
                r#"
                INSERT INTO favourites (user_id, snippet_id, created_at)
                SELECT ?, ?, ?
                WHERE EXISTS (SELECT 1 FROM snippets WHERE id = ?)
                "#,
            )
            .bind(user_id)
            .bind(snippet_id)
            .bind(now)
            .bind(snippet_id)
            .execute(sqlite(&self.pool)?)
            .await
            .map(|r| r.rows_affected()),
            DatabaseDriver::Mysql => sqlx::query(
                r#"
                INSERT INTO favourites (user_id, snippet_id, created_at)
                SELECT ?, ?, ? FROM DUAL
                WHERE EXISTS (SELECT 1 FROM snippets WHERE id = ?)
                "#,
            )
            .bind(user_id)
            .bind(snippet_id)
            .bind(now)
            .bind(snippet_id)
            .execute(mysql(&self.pool)?)
            .await
            .map(|r| r.rows_affected()),
        }
        .context("Failed to add favourite")?;

        Ok(affected > 0)
    }

    async fn delete(&self, user_id: i64, snippet_id: i64) -> Result<bool> {
        let sql = "DELETE FROM favourites WHERE user_id = ? AND snippet_id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(user_id)
                .bind(snippet_id)
                .execute(sqlite(&self.pool)?)
                .await
                .map(|r| r.rows_affected()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(user_id)
                .bind(snippet_id)
                .execute(mysql(&self.pool)?)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to remove favourite")?;

        Ok(affected > 0)
    }
}
