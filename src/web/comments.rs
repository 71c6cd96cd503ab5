//! Commentary posting

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};

use crate::models::Author;
use crate::session::{Session, FLASH};
use crate::validator::{not_blank, Validator};
use crate::web::error::{parse_id, AppError};
use crate::web::middleware::{form_value, template_data, AppState, AuthenticatedUser};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CommentaryForm {
    pub content: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

/// POST /snippet/comment/{id}
///
/// An invalid commentary re-renders the snippet page with the error next to
/// the comment box.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    form: Result<Form<CommentaryForm>, FormRejection>,
) -> Result<Response, AppError> {
    let snippet_id = parse_id(&id)?;
    let Form(mut form) = form?;

    form.validator
        .check_field(not_blank(&form.content), "content", "This field cannot be blank");
    if !form.validator.valid() {
        let snippet = state.snippet_service.get(snippet_id).await?;
        let mut data = template_data(&session, Some(&user));
        data.snippet = Some(snippet);
        data.form = Some(form_value(&form)?);
        return state.render(StatusCode::UNPROCESSABLE_ENTITY, "view.html", &data);
    }

    let author = Author {
        id: user.id,
        name: user.name,
    };
    state
        .commentary_service
        .add(snippet_id, &author, &form.content)
        .await?;

    session.put(FLASH, "Comment added successfully!");
    Ok(Redirect::to(&format!("/snippet/view/{}", snippet_id)).into_response())
}
