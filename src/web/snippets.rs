//! Snippet pages
//!
//! - `GET /` latest snippets
//! - `GET /snippet/view/{id}` one snippet with its commentaries
//! - `GET|POST /snippet/create` creation form (login required)

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};

use crate::models::Author;
use crate::session::{Session, FLASH};
use crate::validator::{max_chars, not_blank, Validator};
use crate::web::comments::CommentaryForm;
use crate::web::error::{parse_id, AppError};
use crate::web::middleware::{form_value, template_data, AppState, AuthenticatedUser, Viewer};

/// Longest accepted snippet title, in characters
pub const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub tag: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl SnippetCreateForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.title), "title", "This field cannot be blank");
        v.check_field(
            max_chars(&self.title, MAX_TITLE_CHARS),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(not_blank(&self.tag), "tag", "This field cannot be blank");
        v.check_field(not_blank(&self.content), "content", "This field cannot be blank");
    }
}

/// GET /
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    Viewer(viewer): Viewer,
) -> Result<Response, AppError> {
    let snippets = state.snippet_service.latest().await?;

    let mut data = template_data(&session, viewer.as_ref());
    data.snippets = snippets;
    state.render(StatusCode::OK, "home.html", &data)
}

/// GET /snippet/view/{id}
pub async fn view(
    State(state): State<AppState>,
    session: Session,
    Viewer(viewer): Viewer,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let snippet = state.snippet_service.get(id).await?;

    let mut data = template_data(&session, viewer.as_ref());
    data.snippet = Some(snippet);
    data.form = Some(form_value(&CommentaryForm::default())?);
    state.render(StatusCode::OK, "view.html", &data)
}

/// GET /snippet/create
pub async fn create_form(
    State(state): State<AppState>,
    session: Session,
    user: AuthenticatedUser,
) -> Result<Response, AppError> {
    let mut data = template_data(&session, Some(&user));
    data.form = Some(form_value(&SnippetCreateForm::default())?);
    state.render(StatusCode::OK, "create.html", &data)
}

/// POST /snippet/create
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    user: AuthenticatedUser,
    form: Result<Form<SnippetCreateForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(mut form) = form?;
    form.validate();
    if !form.validator.valid() {
        let mut data = template_data(&session, Some(&user));
        data.form = Some(form_value(&form)?);
        return state.render(StatusCode::UNPROCESSABLE_ENTITY, "create.html", &data);
    }

    let author = Author {
        id: user.id,
        name: user.name,
    };
    let id = state
        .snippet_service
        .insert(&form.title, &form.content, &form.tag, &author)
        .await?;

    session.put(FLASH, "Snippet successfully created!");
    Ok(Redirect::to(&format!("/snippet/view/{}", id)).into_response())
}
