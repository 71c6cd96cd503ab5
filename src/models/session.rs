//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key/value payload of a session, stored as JSON
pub type SessionData = HashMap<String, serde_json::Value>;

/// A persisted session row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session token
    pub id: String,
    pub data: SessionData,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
