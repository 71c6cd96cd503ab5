//! Commentary model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Author;

/// A comment attached to exactly one snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commentary {
    pub author: Author,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
