//! Data models
//!
//! Plain data structures shared by the repositories, services and templates.
//! Derived values (author names, favourite counts, a user's snippet lists)
//! are filled in by the repositories at read time and never stored twice.

mod commentary;
mod session;
mod snippet;
mod user;

pub use commentary::Commentary;
pub use session::{SessionData, SessionRecord};
pub use snippet::{Author, Snippet};
pub use user::User;
