//! User repository
//!
//! Database operations for user accounts. The account's snippet lists are
//! assembled by the service layer from [`super::SnippetRepository`].

use crate::config::DatabaseDriver;
use crate::db::{mysql, sqlite, DynDatabasePool};
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user and return its ID.
    ///
    /// A duplicate email surfaces as a unique-constraint violation, see
    /// [`crate::db::is_unique_violation`].
    async fn insert(&self, name: &str, email: &str, hashed_password: &str) -> Result<i64>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Check whether a user with the given ID exists
    async fn exists(&self, id: i64) -> Result<bool>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn insert(&self, name: &str, email: &str, hashed_password: &str) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                insert_user_sqlite(sqlite(&self.pool)?, name, email, hashed_password).await
            }
            DatabaseDriver::Mysql => {
                insert_user_mysql(mysql(&self.pool)?, name, email, hashed_password).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_email_sqlite(sqlite(&self.pool)?, email).await,
            DatabaseDriver::Mysql => get_user_by_email_mysql(mysql(&self.pool)?, email).await,
        }
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => user_exists_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => user_exists_mysql(mysql(&self.pool)?, id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn insert_user_sqlite(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    hashed_password: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, hashed_password, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(hashed_password)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(result.last_insert_rowid())
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, name, email, hashed_password, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    Ok(row.map(|row| row_to_user_sqlite(&row)))
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, name, email, hashed_password, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    Ok(row.map(|row| row_to_user_sqlite(&row)))
}

async fn user_exists_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to check user existence")?;

    Ok(exists != 0)
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        hashed_password: row.get("hashed_password"),
        created_at: row.get("created_at"),
        created_snippets: Vec::new(),
        favourites: Vec::new(),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn insert_user_mysql(
    pool: &MySqlPool,
    name: &str,
    email: &str,
    hashed_password: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, hashed_password, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(hashed_password)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(result.last_insert_id() as i64)
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, name, email, hashed_password, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    Ok(row.map(|row| row_to_user_mysql(&row)))
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, name, email, hashed_password, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    Ok(row.map(|row| row_to_user_mysql(&row)))
}

async fn user_exists_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to check user existence")?;

    Ok(exists != 0)
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        hashed_password: row.get("hashed_password"),
        created_at: row.get("created_at"),
        created_snippets: Vec::new(),
        favourites: Vec::new(),
    }
}
