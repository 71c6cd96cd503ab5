//! Session repository
//!
//! Server-side session rows keyed by their token. The payload is stored as a
//! JSON object in the `data` column.

use crate::config::DatabaseDriver;
use crate::db::{mysql, sqlite, DynDatabasePool};
use crate::models::{SessionData, SessionRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Get session by ID (token), expired or not
    async fn get_by_id(&self, id: &str) -> Result<Option<SessionRecord>>;

    /// Insert a session or replace the data and expiry of an existing one
    async fn upsert(&self, session: &SessionRecord) -> Result<()>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete expired sessions, returning how many were removed
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn get_by_id(&self, id: &str) -> Result<Option<SessionRecord>> {
        let sql = "SELECT id, data, expires_at, created_at FROM sessions WHERE id = ?";
        let raw = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .fetch_optional(sqlite(&self.pool)?)
                .await
                .context("Failed to get session by ID")?
                .map(|row| {
                    (
                        row.get::<String, _>("data"),
                        row.get::<DateTime<Utc>, _>("expires_at"),
                        row.get::<DateTime<Utc>, _>("created_at"),
                    )
                }),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .fetch_optional(mysql(&self.pool)?)
                .await
                .context("Failed to get session by ID")?
                .map(|row| {
                    (
                        row.get::<String, _>("data"),
                        row.get::<DateTime<Utc>, _>("expires_at"),
                        row.get::<DateTime<Utc>, _>("created_at"),
                    )
                }),
        };

        let Some((data, expires_at, created_at)) = raw else {
            return Ok(None);
        };
        let data: SessionData =
            serde_json::from_str(&data).context("Failed to decode session data")?;

        Ok(Some(SessionRecord {
            id: id.to_string(),
            data,
            expires_at,
            created_at,
        }))
    }

    async fn upsert(&self, session: &SessionRecord) -> Result<()> {
        let data = serde_json::to_string(&session.data).context("Failed to encode session data")?;

        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(
                    r#"
                    INSERT INTO sessions (id, data, expires_at, created_at)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(id) DO UPDATE SET data = excluded.data, expires_at = excluded.expires_at
                    "#,
                )
                .bind(&session.id)
                .bind(&data)
                .bind(session.expires_at)
                .bind(session.created_at)
                .execute(sqlite(&self.pool)?)
                .await
                .map(|_| ())
            }
            DatabaseDriver::Mysql => {
                sqlx::query(
                    r#"
                    INSERT INTO sessions (id, data, expires_at, created_at)
                    VALUES (?, ?, ?, ?)
                    ON DUPLICATE KEY UPDATE data = VALUES(data), expires_at = VALUES(expires_at)
                    "#,
                )
                .bind(&session.id)
                .bind(&data)
                .bind(session.expires_at)
                .bind(session.created_at)
                .execute(mysql(&self.pool)?)
                .await
                .map(|_| ())
            }
        }
        .context("Failed to save session")?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let sql = "DELETE FROM sessions WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .map(|_| ()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .map(|_| ()),
        }
        .context("Failed to delete session")?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let sql = "DELETE FROM sessions WHERE expires_at <= ?";
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(now)
                .execute(sqlite(&self.pool)?)
                .await
                .map(|r| r.rows_affected()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(now)
                .execute(mysql(&self.pool)?)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete expired sessions")?;

        Ok(affected)
    }
}
