//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for a specific entity.

pub mod commentary;
pub mod favourite;
pub mod session;
pub mod snippet;
pub mod user;

pub use commentary::{CommentaryRepository, SqlxCommentaryRepository};
pub use favourite::{FavouriteRepository, SqlxFavouriteRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use snippet::{SnippetRepository, SqlxSnippetRepository};
pub use user::{SqlxUserRepository, UserRepository};
