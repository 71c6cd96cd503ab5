//! Commentary repository

use crate::config::DatabaseDriver;
use crate::db::{mysql, sqlite, DynDatabasePool};
use crate::models::{Author, Commentary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Commentary repository trait
#[async_trait]
pub trait CommentaryRepository: Send + Sync {
    /// Attach a commentary to a snippet in a single statement.
    ///
    /// Returns `false` when the snippet does not exist.
    async fn insert(&self, snippet_id: i64, author_id: i64, content: &str) -> Result<bool>;

    /// Commentaries of a snippet, oldest first
    async fn list_by_snippet(&self, snippet_id: i64) -> Result<Vec<Commentary>>;
}

/// SQLx-based commentary repository implementation
pub struct SqlxCommentaryRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentaryRepository {
    /// Create a new SQLx commentary repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentaryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentaryRepository for SqlxCommentaryRepository {
    async fn insert(&self, snippet_id: i64, author_id: i64, content: &str) -> Result<bool> {
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(
                r#"
                INSERT INTO comments (snippet_id, author_id, content, created_at)
                SELECT ?, ?, ?, ?
                WHERE EXISTS (SELECT 1 FROM snippets WHERE id = ?)
                "#,
            )
            .bind(snippet_id)
            .bind(author_id)
            .bind(content)
            .bind(now)
            .bind(snippet_id)
            .execute(sqlite(&self.pool)?)
            .await
            .map(|r| r.rows_affected()),
            DatabaseDriver::Mysql => sqlx::query(
                r#"
                INSERT INTO comments (snippet_id, author_id, content, created_at)
                SELECT ?, ?, ?, ? FROM DUAL
                WHERE EXISTS (SELECT 1 FROM snippets WHERE id = ?)
                "#,
            )
            .bind(snippet_id)
            .bind(author_id)
            .bind(content)
            .bind(now)
            .bind(snippet_id)
            .execute(mysql(&self.pool)?)
            .await
            .map(|r| r.rows_affected()),
        }
        .context("Failed to add commentary")?;

        Ok(affected > 0)
    }

    async fn list_by_snippet(&self, snippet_id: i64) -> Result<Vec<Commentary>> {
        let sql = r#"
            SELECT c.content, c.created_at, c.author_id, u.name AS author_name
            FROM comments c
            INNER JOIN users u ON u.id = c.author_id
            WHERE c.snippet_id = ?
            ORDER BY c.id ASC
        "#;

        let commentaries = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(snippet_id)
                .fetch_all(sqlite(&self.pool)?)
                .await
                .context("Failed to list commentaries")?
                .iter()
                .map(|row| Commentary {
                    author: Author {
                        id: row.get("author_id"),
                        name: row.get("author_name"),
                    },
                    content: row.get("content"),
                    created_at: row.get("created_at"),
                })
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(snippet_id)
                .fetch_all(mysql(&self.pool)?)
                .await
                .context("Failed to list commentaries")?
                .iter()
                .map(|row| Commentary {
                    author: Author {
                        id: row.get("author_id"),
                        name: row.get("author_name"),
                    },
                    content: row.get("content"),
                    created_at: row.get("created_at"),
                })
                .collect(),
        };

        Ok(commentaries)
    }
}
