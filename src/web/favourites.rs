//! Favourite toggling
//!
//! Both actions finish on the account page with a flash message.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};

use crate::services::user::UserServiceError;
use crate::session::{Session, FLASH};
use crate::web::error::{parse_id, AppError};
use crate::web::middleware::{AppState, AuthenticatedUser};

const ACCOUNT_PATH: &str = "/account/view";

/// POST /favourites/add/{id}
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let snippet_id = parse_id(&id)?;

    match state.user_service.add_favourite(snippet_id, user.id).await {
        Ok(()) => session.put(FLASH, "Snippet added to favourites!"),
        Err(UserServiceError::AlreadyFavourited) => {
            session.put(FLASH, "Snippet is already in favourites!")
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(ACCOUNT_PATH).into_response())
}

/// POST /favourites/remove/{id}
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let snippet_id = parse_id(&id)?;
    let snippet = state.snippet_service.get(snippet_id).await?;

    state
        .user_service
        .remove_favourite(&snippet, snippet_id, user.id)
        .await?;

    session.put(FLASH, "Snippet removed from favourites!");
    Ok(Redirect::to(ACCOUNT_PATH).into_response())
}
