//! Web layer - HTTP handlers and routing
//!
//! Server-rendered pages for:
//! - Browsing and creating snippets
//! - Commentaries and favourites
//! - Signup, login, logout and account pages
//! - Embedded static assets

pub mod comments;
pub mod error;
pub mod favourites;
pub mod middleware;
pub mod snippets;
pub mod static_files;
pub mod users;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::session::load_and_save;

pub use error::AppError;
pub use middleware::{AppState, AuthenticatedUser, Viewer};

/// Build the complete router with middleware
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    // Routes that need a logged-in user
    let protected_routes = Router::new()
        .route(
            "/snippet/create",
            get(snippets::create_form).post(snippets::create),
        )
        .route("/snippet/comment/{id}", post(comments::create))
        .route("/favourites/add/{id}", post(favourites::add))
        .route("/favourites/remove/{id}", post(favourites::remove))
        .route("/account/view", get(users::account))
        .route("/user/logout", post(users::logout))
        .route_layer(axum_middleware::from_fn(middleware::require_auth));

    Router::new()
        .route("/", get(snippets::home))
        .route("/snippet/view/{id}", get(snippets::view))
        .route("/user/signup", get(users::signup_form).post(users::signup))
        .route("/user/login", get(users::login_form).post(users::login))
        .route("/account/view/{id}", get(users::other_account))
        .route("/static/{*path}", get(static_files::serve_static))
        .route("/ping", get(ping))
        .merge(protected_routes)
        // Runs inside the session layer, which it reads from
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.sessions.clone(),
            load_and_save,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(axum_middleware::from_fn(middleware::secure_headers)),
        )
        .with_state(state)
}

/// GET /ping
async fn ping() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
