//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Snippet;

/// A registered account together with the snippets it wrote and favourited
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Snippets written by this user, newest first
    #[serde(default)]
    pub created_snippets: Vec<Snippet>,
    /// Snippets this user favourited, most recently favourited first
    #[serde(default)]
    pub favourites: Vec<Snippet>,
}
