//! Snippet repository
//!
//! Every read joins the author's name from `users` and counts favourites
//! from `favourites`, so neither value is ever stored on the snippet row.

use crate::config::DatabaseDriver;
use crate::db::{mysql, sqlite, DynDatabasePool};
use crate::models::{Author, Snippet};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Columns shared by every snippet query
const SNIPPET_SELECT: &str = r#"
    SELECT s.id, s.title, s.content, s.tag, s.created_at,
           s.author_id, u.name AS author_name,
           (SELECT COUNT(*) FROM favourites f WHERE f.snippet_id = s.id) AS favourited
    FROM snippets s
    INNER JOIN users u ON u.id = s.author_id
"#;

/// Snippet repository trait
#[async_trait]
pub trait SnippetRepository: Send + Sync {
    /// Insert a snippet and return its ID
    async fn insert(&self, title: &str, content: &str, tag: &str, author_id: i64) -> Result<i64>;

    /// Get snippet by ID, without commentaries
    async fn get_by_id(&self, id: i64) -> Result<Option<Snippet>>;

    /// Most recent snippets, newest first
    async fn latest(&self, limit: i64) -> Result<Vec<Snippet>>;

    /// Snippets written by a user, newest first
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Snippet>>;

    /// Snippets a user favourited, most recently favourited first
    async fn list_favourites(&self, user_id: i64) -> Result<Vec<Snippet>>;
}

/// SQLx-based snippet repository implementation
pub struct SqlxSnippetRepository {
    pool: DynDatabasePool,
}

impl SqlxSnippetRepository {
    /// Create a new SQLx snippet repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SnippetRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SnippetRepository for SqlxSnippetRepository {
    async fn insert(&self, title: &str, content: &str, tag: &str, author_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                insert_snippet_sqlite(sqlite(&self.pool)?, title, content, tag, author_id).await
            }
            DatabaseDriver::Mysql => {
                insert_snippet_mysql(mysql(&self.pool)?, title, content, tag, author_id).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Snippet>> {
        let sql = format!("{} WHERE s.id = ?", SNIPPET_SELECT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get snippet by ID")?;
                Ok(row.map(|row| row_to_snippet_sqlite(&row)))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get snippet by ID")?;
                Ok(row.map(|row| row_to_snippet_mysql(&row)))
            }
        }
    }

    async fn latest(&self, limit: i64) -> Result<Vec<Snippet>> {
        let sql = format!("{} ORDER BY s.id DESC LIMIT ?", SNIPPET_SELECT);
        self.fetch_list(&sql, limit, "Failed to list latest snippets")
            .await
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Snippet>> {
        let sql = format!("{} WHERE s.author_id = ? ORDER BY s.id DESC", SNIPPET_SELECT);
        self.fetch_list(&sql, author_id, "Failed to list snippets by author")
            .await
    }

    async fn list_favourites(&self, user_id: i64) -> Result<Vec<Snippet>> {
        let sql = format!(
            r#"{}
            INNER JOIN favourites fav ON fav.snippet_id = s.id
            WHERE fav.user_id = ?
            ORDER BY fav.created_at DESC, s.id DESC"#,
            SNIPPET_SELECT
        );
        self.fetch_list(&sql, user_id, "Failed to list favourite snippets")
            .await
    }
}

impl SqlxSnippetRepository {
    /// Run a snippet query taking a single integer parameter
    async fn fetch_list(&self, sql: &str, param: i64, context: &'static str) -> Result<Vec<Snippet>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql)
                    .bind(param)
                    .fetch_all(sqlite(&self.pool)?)
                    .await
                    .context(context)?;
                Ok(rows.iter().map(row_to_snippet_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql)
                    .bind(param)
                    .fetch_all(mysql(&self.pool)?)
                    .await
                    .context(context)?;
                Ok(rows.iter().map(row_to_snippet_mysql).collect())
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn insert_snippet_sqlite(
    pool: &SqlitePool,
    title: &str,
    content: &str,
    tag: &str,
    author_id: i64,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO snippets (title, content, tag, author_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(tag)
    .bind(author_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to create snippet")?;

    Ok(result.last_insert_rowid())
}

fn row_to_snippet_sqlite(row: &sqlx::sqlite::SqliteRow) -> Snippet {
    Snippet {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        tag: row.get("tag"),
        author: Author {
            id: row.get("author_id"),
            name: row.get("author_name"),
        },
        created_at: row.get("created_at"),
        favourited: row.get("favourited"),
        commentaries: Vec::new(),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn insert_snippet_mysql(
    pool: &MySqlPool,
    title: &str,
    content: &str,
    tag: &str,
    author_id: i64,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO snippets (title, content, tag, author_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(tag)
    .bind(author_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to create snippet")?;

    Ok(result.last_insert_id() as i64)
}

fn row_to_snippet_mysql(row: &sqlx::mysql::MySqlRow) -> Snippet {
    Snippet {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        tag: row.get("tag"),
        author: Author {
            id: row.get("author_id"),
            name: row.get("author_name"),
        },
        created_at: row.get("created_at"),
        favourited: row.get("favourited"),
        commentaries: Vec::new(),
    }
}
