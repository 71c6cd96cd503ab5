//! Handler error type

use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::services::commentary::CommentaryServiceError;
use crate::services::snippet::SnippetServiceError;
use crate::services::user::UserServiceError;
use crate::templates::TemplateError;

/// Failure of a request handler
///
/// Client errors answer with their reason phrase. Internal errors are logged
/// and answered with a generic 500 so no detail reaches the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed request, e.g. an identifier that is not a positive integer
    /// or a body that is not a urlencoded form
    #[error("Bad Request")]
    BadRequest,

    #[error("Not Found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(e) = &self {
            tracing::error!("{:#}", e);
        }

        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}

impl From<SnippetServiceError> for AppError {
    fn from(e: SnippetServiceError) -> Self {
        match e {
            SnippetServiceError::NotFound => AppError::NotFound,
            SnippetServiceError::InternalError(e) => AppError::Internal(e),
        }
    }
}

impl From<CommentaryServiceError> for AppError {
    fn from(e: CommentaryServiceError) -> Self {
        match e {
            CommentaryServiceError::NotFound => AppError::NotFound,
            CommentaryServiceError::InternalError(e) => AppError::Internal(e),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::NotFound => AppError::NotFound,
            UserServiceError::InternalError(e) => AppError::Internal(e),
            // Handlers deal with the domain variants themselves; anything
            // reaching this point is unexpected.
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(e: FormRejection) -> Self {
        tracing::debug!("Rejected form body: {}", e.body_text());
        AppError::BadRequest
    }
}

impl From<TemplateError> for AppError {
    fn from(e: TemplateError) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

/// Parse a path identifier; anything but a positive integer is a bad request.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest),
    }
}
