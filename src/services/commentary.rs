//! Commentary service

use crate::db::repositories::CommentaryRepository;
use crate::models::Author;
use std::sync::Arc;

/// Error types for commentary service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentaryServiceError {
    /// The snippet being commented on does not exist
    #[error("Snippet not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Commentary service
pub struct CommentaryService {
    commentary_repo: Arc<dyn CommentaryRepository>,
}

impl CommentaryService {
    /// Create a new commentary service
    pub fn new(commentary_repo: Arc<dyn CommentaryRepository>) -> Self {
        Self { commentary_repo }
    }

    /// Append a commentary to a snippet.
    ///
    /// Nothing is written when the snippet does not exist.
    pub async fn add(
        &self,
        snippet_id: i64,
        author: &Author,
        content: &str,
    ) -> Result<(), CommentaryServiceError> {
        if !self
            .commentary_repo
            .insert(snippet_id, author.id, content)
            .await?
        {
            return Err(CommentaryServiceError::NotFound);
        }

        tracing::debug!(snippet_id, author = %author.name, "Commentary added");
        Ok(())
    }
}
