//! Shared state, middleware and extractors
//!
//! Contains:
//! - `AppState` with the services every handler needs
//! - Authentication (session user lookup) and the login guard
//! - Security headers applied to every response
//! - Helpers building the per-page template data

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::db::repositories::{
    SqlxCommentaryRepository, SqlxFavouriteRepository, SqlxSessionRepository,
    SqlxSnippetRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::commentary::CommentaryService;
use crate::services::snippet::SnippetService;
use crate::services::user::UserService;
use crate::session::{Session, SessionManager, AUTHENTICATED_USER_ID, FLASH, USER_NAME};
use crate::templates::{TemplateData, TemplateEngine};
use crate::web::error::AppError;

/// Where anonymous visitors of protected pages are sent
pub const LOGIN_PATH: &str = "/user/login";

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub snippet_service: Arc<SnippetService>,
    pub user_service: Arc<UserService>,
    pub commentary_service: Arc<CommentaryService>,
    pub sessions: Arc<SessionManager>,
    pub templates: Arc<TemplateEngine>,
}

impl AppState {
    /// Wire repositories and services on top of `pool`
    pub fn new(pool: DynDatabasePool, session_config: &SessionConfig, templates: TemplateEngine) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let snippet_repo = SqlxSnippetRepository::boxed(pool.clone());
        let commentary_repo = SqlxCommentaryRepository::boxed(pool.clone());
        let favourite_repo = SqlxFavouriteRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool);

        Self {
            snippet_service: Arc::new(SnippetService::new(
                snippet_repo.clone(),
                commentary_repo.clone(),
            )),
            user_service: Arc::new(UserService::new(user_repo, snippet_repo, favourite_repo)),
            commentary_service: Arc::new(CommentaryService::new(commentary_repo)),
            sessions: Arc::new(SessionManager::new(session_repo, session_config)),
            templates: Arc::new(templates),
        }
    }

    /// Render a page into a complete response with `status`
    pub fn render(
        &self,
        status: StatusCode,
        page: &str,
        data: &TemplateData,
    ) -> Result<Response, AppError> {
        let html = self.templates.render_data(page, data)?;
        Ok((status, Html(html)).into_response())
    }
}

/// Logged-in user, as recorded in the session
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub name: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| Redirect::to(LOGIN_PATH))
    }
}

/// The current visitor, logged in or not
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}

/// Authentication middleware
///
/// Exposes an [`AuthenticatedUser`] when the session names a user that still
/// exists. Must run inside the session layer.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = request.extensions().get::<Session>().cloned();

    if let Some(session) = session {
        if let Some(id) = session.get::<i64>(AUTHENTICATED_USER_ID) {
            if state.user_service.exists(id).await? {
                let name = session.get_string(USER_NAME).unwrap_or_default();
                request
                    .extensions_mut()
                    .insert(AuthenticatedUser { id, name });
            } else {
                tracing::debug!(user_id = id, "Session refers to a deleted user");
            }
        }
    }

    Ok(next.run(request).await)
}

/// Login guard for protected routes
///
/// Anonymous requests are redirected to the login page. Responses to
/// protected routes are never stored by caches.
pub async fn require_auth(request: Request, next: Next) -> Response {
    let mut response = if request.extensions().get::<AuthenticatedUser>().is_some() {
        next.run(request).await
    } else {
        Redirect::to(LOGIN_PATH).into_response()
    };

    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Add the security headers every page carries
pub async fn secure_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("origin-when-cross-origin"),
    );
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("deny"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));

    response
}

/// Template data common to every page; consumes the pending flash message.
pub fn template_data(session: &Session, user: Option<&AuthenticatedUser>) -> TemplateData {
    let mut data = TemplateData::new();
    data.flash = session.pop_string(FLASH);
    if let Some(user) = user {
        data.is_authenticated = true;
        data.user_name = Some(user.name.clone());
    }
    data
}

/// Serialize a form (values plus validation errors) for the templates
pub fn form_value<T: Serialize>(form: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(form).map_err(|e| AppError::Internal(e.into()))
}
