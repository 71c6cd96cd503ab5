//! User service
//!
//! Implements business logic for accounts:
//! - Signup with unique email addresses
//! - Credential checks for login
//! - Account pages with authored and favourited snippets
//! - Adding and removing favourites

use crate::db::is_unique_violation;
use crate::db::repositories::{FavouriteRepository, SnippetRepository, UserRepository};
use crate::models::{Snippet, User};
use crate::services::password::{hash_password, verify_password};
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Another account already uses this email address
    #[error("Email address is already in use")]
    DuplicateEmail,

    /// Unknown email or wrong password; the two are deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The snippet is already in the user's favourites
    #[error("Snippet is already in favourites")]
    AlreadyFavourited,

    /// User or snippet not found
    #[error("Not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for accounts, authentication and favourites
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    snippet_repo: Arc<dyn SnippetRepository>,
    favourite_repo: Arc<dyn FavouriteRepository>,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        snippet_repo: Arc<dyn SnippetRepository>,
        favourite_repo: Arc<dyn FavouriteRepository>,
    ) -> Self {
        Self {
            user_repo,
            snippet_repo,
            favourite_repo,
        }
    }

    /// Register a new account and return its ID.
    ///
    /// # Errors
    ///
    /// - `DuplicateEmail` if the email is already registered
    /// - `InternalError` for hashing or database errors
    pub async fn insert(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, UserServiceError> {
        let hashed_password = hash_password(password)?;

        match self.user_repo.insert(name, email, &hashed_password).await {
            Ok(id) => {
                tracing::info!(user_id = id, "User registered");
                Ok(id)
            }
            Err(e) if is_unique_violation(&e) => Err(UserServiceError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials, returning the user's ID and display name.
    ///
    /// An unknown email and a wrong password both yield `InvalidCredentials`.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(i64, String), UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(email)
            .await?
            .ok_or(UserServiceError::InvalidCredentials)?;

        if !verify_password(password, &user.hashed_password)? {
            return Err(UserServiceError::InvalidCredentials);
        }

        Ok((user.id, user.name))
    }

    /// Load an account with its created snippets and favourites
    pub async fn get(&self, id: i64) -> Result<User, UserServiceError> {
        let mut user = self
            .user_repo
            .get_by_id(id)
            .await?
            .ok_or(UserServiceError::NotFound)?;

        user.created_snippets = self.snippet_repo.list_by_author(id).await?;
        user.favourites = self.snippet_repo.list_favourites(id).await?;
        Ok(user)
    }

    /// Check whether an account still exists
    pub async fn exists(&self, id: i64) -> Result<bool, UserServiceError> {
        Ok(self.user_repo.exists(id).await?)
    }

    /// Add a snippet to the user's favourites.
    ///
    /// # Errors
    ///
    /// - `AlreadyFavourited` if the pair is already recorded, including when a
    ///   concurrent request inserted it first
    /// - `NotFound` if the snippet does not exist
    pub async fn add_favourite(&self, snippet_id: i64, user_id: i64) -> Result<(), UserServiceError> {
        if self.favourite_repo.exists(user_id, snippet_id).await? {
            return Err(UserServiceError::AlreadyFavourited);
        }

        match self.favourite_repo.insert(user_id, snippet_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(UserServiceError::NotFound),
            Err(e) if is_unique_violation(&e) => Err(UserServiceError::AlreadyFavourited),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a snippet from the user's favourites.
    ///
    /// `snippet` is the already-loaded snippet identified by `snippet_id`.
    /// Removing a snippet that is not a favourite changes nothing.
    pub async fn remove_favourite(
        &self,
        snippet: &Snippet,
        snippet_id: i64,
        user_id: i64,
    ) -> Result<(), UserServiceError> {
        if snippet.id != snippet_id {
            return Err(UserServiceError::NotFound);
        }

        if !self.favourite_repo.delete(user_id, snippet_id).await? {
            tracing::debug!(user_id, snippet_id, "Snippet was not a favourite");
        }
        Ok(())
    }
}
