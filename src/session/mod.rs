//! Server-side sessions
//!
//! A session is a JSON key/value map stored in the `sessions` table and
//! addressed by an opaque token carried in a cookie. [`load_and_save`] loads
//! the session before the handler runs, exposes it as a [`Session`] request
//! extension and persists it afterwards if the handler changed it.
//!
//! Expiry slides: every save pushes `expires_at` to `now + lifetime`.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::db::repositories::SessionRepository;
use crate::models::{SessionData, SessionRecord};

/// Session key holding the logged-in user's ID
pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";
/// Session key holding the logged-in user's display name
pub const USER_NAME: &str = "userName";
/// Session key holding a one-shot message for the next page
pub const FLASH: &str = "flash";

#[derive(Debug)]
struct SessionState {
    token: String,
    /// Token under which this session is currently stored, if any
    stored_token: Option<String>,
    data: SessionData,
    created_at: DateTime<Utc>,
    modified: bool,
}

/// Per-request handle to the current session
///
/// Cloning the handle shares the underlying state, so changes made by a
/// handler are seen by the layer that saves the session.
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    fn fresh() -> Self {
        Self::from_state(SessionState {
            token: new_token(),
            stored_token: None,
            data: SessionData::new(),
            created_at: Utc::now(),
            modified: false,
        })
    }

    fn from_record(record: SessionRecord) -> Self {
        Self::from_state(SessionState {
            token: record.id.clone(),
            stored_token: Some(record.id),
            data: record.data,
            created_at: record.created_at,
            modified: false,
        })
    }

    fn from_state(state: SessionState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decode the value stored under `key`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.lock().data.get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    pub fn put(&self, key: &str, value: impl Into<serde_json::Value>) {
        let mut state = self.lock();
        state.data.insert(key.to_string(), value.into());
        state.modified = true;
    }

    pub fn remove(&self, key: &str) {
        let mut state = self.lock();
        if state.data.remove(key).is_some() {
            state.modified = true;
        }
    }

    /// Read a string and delete it in one step (flash messages)
    pub fn pop_string(&self, key: &str) -> Option<String> {
        let mut state = self.lock();
        let value = state.data.remove(key)?;
        state.modified = true;
        value.as_str().map(str::to_string)
    }

    /// Move the session to a new token, keeping its data.
    ///
    /// The row stored under the old token is deleted when the session is saved.
    pub fn renew_token(&self) {
        let mut state = self.lock();
        state.token = new_token();
        state.modified = true;
    }

    /// Current session token
    pub fn token(&self) -> String {
        self.lock().token.clone()
    }
}

fn new_token() -> String {
    Uuid::new_v4().to_string()
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Session layer is not installed"))
    }
}

/// Loads, saves and expires sessions
pub struct SessionManager {
    repo: Arc<dyn SessionRepository>,
    cookie_name: String,
    lifetime: Duration,
    secure: bool,
}

impl SessionManager {
    pub fn new(repo: Arc<dyn SessionRepository>, config: &SessionConfig) -> Self {
        Self {
            repo,
            cookie_name: config.cookie_name.clone(),
            lifetime: Duration::try_hours(config.lifetime_hours)
                .filter(|lifetime| *lifetime > Duration::zero())
                .unwrap_or_else(|| Duration::hours(12)),
            secure: config.secure_cookie,
        }
    }

    /// Load the session for `token`.
    ///
    /// Missing, unknown and expired tokens all yield a fresh empty session;
    /// an expired row is deleted on the way.
    pub async fn load(&self, token: Option<&str>) -> anyhow::Result<Session> {
        let Some(token) = token else {
            return Ok(Session::fresh());
        };

        match self.repo.get_by_id(token).await? {
            Some(record) if record.is_expired() => {
                self.repo.delete(&record.id).await?;
                Ok(Session::fresh())
            }
            Some(record) => Ok(Session::from_record(record)),
            None => Ok(Session::fresh()),
        }
    }

    /// Persist a modified session.
    ///
    /// Returns the `Set-Cookie` value to send whenever the session was
    /// written, so the cookie lifetime follows the sliding expiry. Unmodified
    /// sessions are not touched and yield `None`.
    pub async fn save(&self, session: &Session) -> anyhow::Result<Option<String>> {
        let (record, rotated_from) = {
            let mut state = session.lock();
            if !state.modified {
                return Ok(None);
            }
            let expires_at = Utc::now()
                .checked_add_signed(self.lifetime)
                .ok_or_else(|| anyhow::anyhow!("session expiry overflows"))?;
            let rotated_from = state
                .stored_token
                .take()
                .filter(|stored| *stored != state.token);
            state.stored_token = Some(state.token.clone());
            state.modified = false;

            let record = SessionRecord {
                id: state.token.clone(),
                data: state.data.clone(),
                expires_at,
                created_at: state.created_at,
            };
            (record, rotated_from)
        };

        if let Some(old) = rotated_from {
            self.repo.delete(&old).await?;
        }
        self.repo.upsert(&record).await?;

        Ok(Some(self.cookie(&record.id)))
    }

    /// Delete every expired session, returning how many were removed
    pub async fn cleanup_expired(&self) -> anyhow::Result<u64> {
        self.repo.delete_expired().await
    }

    /// `Set-Cookie` value carrying `token`
    pub fn cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            token,
            self.lifetime.num_seconds()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Session token presented in the request's `Cookie` headers
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, token)| token.to_string())
            .filter(|token| !token.is_empty())
    }
}

/// Session middleware
///
/// Loads the session named by the request cookie, hands it to the inner
/// service as a request extension and saves it once the response is built.
pub async fn load_and_save(
    State(manager): State<Arc<SessionManager>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = manager.token_from_headers(request.headers());
    let session = match manager.load(token.as_deref()).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to load session: {:#}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;

    match manager.save(&session).await {
        Ok(Some(cookie)) => match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                let headers = response.headers_mut();
                headers.append(header::SET_COOKIE, value);
                headers.append(header::VARY, HeaderValue::from_static("Cookie"));
            }
            Err(e) => {
                tracing::error!("Invalid session cookie: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        },
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Failed to save session: {:#}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    response
}
