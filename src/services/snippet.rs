//! Snippet service
//!
//! Creation and retrieval of snippets. A loaded snippet carries its
//! commentaries; listings do not.

use crate::db::repositories::{CommentaryRepository, SnippetRepository};
use crate::models::{Author, Snippet};
use std::sync::Arc;

/// How many snippets the home page shows
pub const LATEST_LIMIT: i64 = 10;

/// Error types for snippet service operations
#[derive(Debug, thiserror::Error)]
pub enum SnippetServiceError {
    /// No snippet with the requested ID
    #[error("Snippet not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Snippet service
pub struct SnippetService {
    snippet_repo: Arc<dyn SnippetRepository>,
    commentary_repo: Arc<dyn CommentaryRepository>,
}

impl SnippetService {
    /// Create a new snippet service with the given repositories
    pub fn new(
        snippet_repo: Arc<dyn SnippetRepository>,
        commentary_repo: Arc<dyn CommentaryRepository>,
    ) -> Self {
        Self {
            snippet_repo,
            commentary_repo,
        }
    }

    /// Store a new snippet written by `author` and return its ID.
    ///
    /// Only the author's ID is persisted; the name shown with the snippet is
    /// always read from the author's account.
    pub async fn insert(
        &self,
        title: &str,
        content: &str,
        tag: &str,
        author: &Author,
    ) -> Result<i64, SnippetServiceError> {
        let id = self
            .snippet_repo
            .insert(title, content, tag, author.id)
            .await?;

        tracing::info!(snippet_id = id, author = %author.name, "Snippet created");
        Ok(id)
    }

    /// Load a snippet together with its commentaries, oldest first
    pub async fn get(&self, id: i64) -> Result<Snippet, SnippetServiceError> {
        let mut snippet = self
            .snippet_repo
            .get_by_id(id)
            .await?
            .ok_or(SnippetServiceError::NotFound)?;

        snippet.commentaries = self.commentary_repo.list_by_snippet(id).await?;
        Ok(snippet)
    }

    /// The ten most recent snippets, newest first
    pub async fn latest(&self) -> Result<Vec<Snippet>, SnippetServiceError> {
        Ok(self.snippet_repo.latest(LATEST_LIMIT).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentaryRepository, SqlxSnippetRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, SnippetService, Author) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let id = SqlxUserRepository::new(pool.clone())
            .insert("Alice", "alice@example.com", "hash")
            .await
            .expect("Failed to create user");
        let service = SnippetService::new(
            SqlxSnippetRepository::boxed(pool.clone()),
            SqlxCommentaryRepository::boxed(pool.clone()),
        );

        (
            pool,
            service,
            Author {
                id,
                name: "Alice".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let (_pool, service, author) = setup_test_service().await;

        let id = service
            .insert("An old silent pond", "A frog jumps in", "haiku", &author)
            .await
            .expect("Failed to insert");

        let snippet = service.get(id).await.expect("Failed to get");
        assert_eq!(snippet.title, "An old silent pond");
        assert_eq!(snippet.author, author);
        assert_eq!(snippet.favourited, 0);
        assert!(snippet.commentaries.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_snippet() {
        let (_pool, service, _) = setup_test_service().await;
        assert!(matches!(
            service.get(42).await,
            Err(SnippetServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_get_includes_commentaries() {
        let (pool, service, author) = setup_test_service().await;
        let id = service.insert("t", "c", "x", &author).await.unwrap();

        SqlxCommentaryRepository::new(pool)
            .insert(id, author.id, "nice one")
            .await
            .unwrap();

        let snippet = service.get(id).await.unwrap();
        assert_eq!(snippet.commentaries.len(), 1);
        assert_eq!(snippet.commentaries[0].content, "nice one");
        assert_eq!(snippet.commentaries[0].author, author);
    }

    #[tokio::test]
    async fn test_latest_is_bounded_and_newest_first() {
        let (_pool, service, author) = setup_test_service().await;

        for i in 0..15 {
            service
                .insert(&format!("snippet {}", i), "content", "tag", &author)
                .await
                .unwrap();
        }

        let latest = service.latest().await.unwrap();
        assert_eq!(latest.len() as i64, LATEST_LIMIT);
        assert!(latest.windows(2).all(|w| w[0].id > w[1].id));
        assert_eq!(latest[0].title, "snippet 14");
    }
}
