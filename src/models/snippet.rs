//! Snippet model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Commentary;

/// Reference to the user who wrote a snippet or commentary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

/// A short titled piece of text shared by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    /// Unique identifier, increasing with creation order
    pub id: i64,
    pub title: String,
    pub content: String,
    pub tag: String,
    pub author: Author,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Number of users holding this snippet in their favourites
    pub favourited: i64,
    /// Commentaries, oldest first. Only populated when a single snippet is loaded.
    #[serde(default)]
    pub commentaries: Vec<Commentary>,
}
