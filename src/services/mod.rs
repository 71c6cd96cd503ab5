//! Services layer - Business logic
//!
//! Services sit between the web handlers and the repositories. They:
//! - Enforce domain rules (unique emails, one favourite per user and snippet)
//! - Compose repository reads into complete views
//! - Report failures as tagged error enums

pub mod commentary;
pub mod password;
pub mod snippet;
pub mod user;

pub use commentary::{CommentaryService, CommentaryServiceError};
pub use password::{hash_password, verify_password};
pub use snippet::{SnippetService, SnippetServiceError, LATEST_LIMIT};
pub use user::{UserService, UserServiceError};
