//! Account pages
//!
//! Signup, login and logout plus the account overview of the logged-in user
//! and the public profile of everybody else.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};

use crate::services::user::UserServiceError;
use crate::session::{Session, AUTHENTICATED_USER_ID, FLASH, USER_NAME};
use crate::validator::{matches, min_chars, not_blank, Validator, EMAIL_RX};
use crate::web::error::{parse_id, AppError};
use crate::web::middleware::{
    form_value, template_data, AppState, AuthenticatedUser, Viewer, LOGIN_PATH,
};

/// Shortest accepted password, in characters
pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl UserSignupForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.name), "name", "This field cannot be blank");
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(not_blank(&self.password), "password", "This field cannot be blank");
        v.check_field(
            min_chars(&self.password, MIN_PASSWORD_CHARS),
            "password",
            "This field must be at least 8 characters long",
        );
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserLoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl UserLoginForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(not_blank(&self.password), "password", "This field cannot be blank");
    }
}

/// GET /user/signup
pub async fn signup_form(
    State(state): State<AppState>,
    session: Session,
    Viewer(viewer): Viewer,
) -> Result<Response, AppError> {
    let mut data = template_data(&session, viewer.as_ref());
    data.form = Some(form_value(&UserSignupForm::default())?);
    state.render(StatusCode::OK, "signup.html", &data)
}

/// POST /user/signup
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Viewer(viewer): Viewer,
    form: Result<Form<UserSignupForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(mut form) = form?;
    form.validate();

    if form.validator.valid() {
        match state
            .user_service
            .insert(&form.name, &form.email, &form.password)
            .await
        {
            Ok(_) => {
                session.put(FLASH, "Your signup was successful. Please log in.");
                return Ok(Redirect::to(LOGIN_PATH).into_response());
            }
            Err(UserServiceError::DuplicateEmail) => {
                form.validator
                    .add_field_error("email", "Email address is already in use");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut data = template_data(&session, viewer.as_ref());
    data.form = Some(form_value(&form)?);
    state.render(StatusCode::UNPROCESSABLE_ENTITY, "signup.html", &data)
}

/// GET /user/login
pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
    Viewer(viewer): Viewer,
) -> Result<Response, AppError> {
    let mut data = template_data(&session, viewer.as_ref());
    data.form = Some(form_value(&UserLoginForm::default())?);
    state.render(StatusCode::OK, "login.html", &data)
}

/// POST /user/login
///
/// A successful login rotates the session token before storing the identity.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Viewer(viewer): Viewer,
    form: Result<Form<UserLoginForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(mut form) = form?;
    form.validate();

    if form.validator.valid() {
        match state
            .user_service
            .authenticate(&form.email, &form.password)
            .await
        {
            Ok((id, name)) => {
                session.renew_token();
                session.put(AUTHENTICATED_USER_ID, id);
                session.put(USER_NAME, name);
                tracing::info!(user_id = id, "User logged in");
                return Ok(Redirect::to("/snippet/create").into_response());
            }
            Err(UserServiceError::InvalidCredentials) => {
                form.validator
                    .add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut data = template_data(&session, viewer.as_ref());
    data.form = Some(form_value(&form)?);
    state.render(StatusCode::UNPROCESSABLE_ENTITY, "login.html", &data)
}

/// POST /user/logout
pub async fn logout(session: Session, user: AuthenticatedUser) -> Response {
    session.renew_token();
    session.remove(AUTHENTICATED_USER_ID);
    session.remove(USER_NAME);
    session.put(FLASH, "You've been logged out successfully!");

    tracing::info!(user_id = user.id, "User logged out");
    Redirect::to("/").into_response()
}

/// GET /account/view
pub async fn account(
    State(state): State<AppState>,
    session: Session,
    user: AuthenticatedUser,
) -> Result<Response, AppError> {
    let account = match state.user_service.get(user.id).await {
        Ok(account) => account,
        Err(UserServiceError::NotFound) => return Ok(Redirect::to(LOGIN_PATH).into_response()),
        Err(e) => return Err(e.into()),
    };

    let mut data = template_data(&session, Some(&user));
    data.user = Some(account);
    state.render(StatusCode::OK, "account.html", &data)
}

/// GET /account/view/{id}
///
/// Visiting one's own profile lands on the private account page.
pub async fn other_account(
    State(state): State<AppState>,
    session: Session,
    Viewer(viewer): Viewer,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    if viewer.as_ref().is_some_and(|v| v.id == id) {
        return Ok(Redirect::to("/account/view").into_response());
    }

    let account = match state.user_service.get(id).await {
        Ok(account) => account,
        Err(UserServiceError::NotFound) => return Ok(Redirect::to(LOGIN_PATH).into_response()),
        Err(e) => return Err(e.into()),
    };

    let mut data = template_data(&session, viewer.as_ref());
    data.user = Some(account);
    state.render(StatusCode::OK, "other_account.html", &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> UserSignupForm {
        UserSignupForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_signup_validation() {
        let mut form = signup("Alice", "alice@example.com", "pa55word");
        form.validate();
        assert!(form.validator.valid());

        let mut form = signup("", "not-an-email", "short");
        form.validate();
        let errors = &form.validator.field_errors;
        assert_eq!(errors["name"], "This field cannot be blank");
        assert_eq!(errors["email"], "This field must be a valid email address");
        assert_eq!(errors["password"], "This field must be at least 8 characters long");
    }

    #[test]
    fn test_blank_email_reports_blank_first() {
        let mut form = signup("Alice", "", "pa55word");
        form.validate();
        assert_eq!(form.validator.field_errors["email"], "This field cannot be blank");
    }

    #[test]
    fn test_password_is_never_serialized() {
        let form = signup("Alice", "alice@example.com", "pa55word");
        let value = form_value(&form).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["email"], "alice@example.com");

        let login = UserLoginForm {
            email: "alice@example.com".to_string(),
            password: "pa55word".to_string(),
            ..Default::default()
        };
        assert!(form_value(&login).unwrap().get("password").is_none());
    }

    #[test]
    fn test_login_validation() {
        let mut form = UserLoginForm::default();
        form.validate();
        assert_eq!(form.validator.field_errors["email"], "This field cannot be blank");
        assert_eq!(form.validator.field_errors["password"], "This field cannot be blank");
    }
}
