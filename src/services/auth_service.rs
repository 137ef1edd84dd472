//! Domain service for sign-up, login and session identity.

use thiserror::Error;

use crate::db::User;
use crate::domain::{Actor, Role};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("That email does not exist, please try again.")]
    UnknownEmail,

    #[error("Password incorrect, please try again.")]
    WrongPassword,

    #[error("You've already signed up with that email, log in instead!")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Registration input as submitted by the sign-up form or the CLI.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Registers a new account. The first account ever created becomes the
    /// administrator.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] if the email is already registered
    /// and [`AuthError::Validation`] if a field is blank.
    async fn sign_up(&self, request: SignUp) -> Result<User, AuthError>;

    /// Same as [`AuthService::sign_up`] but with an explicit role.
    async fn create_user(&self, request: SignUp, role: Role) -> Result<User, AuthError>;

    /// Verifies credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownEmail`] or [`AuthError::WrongPassword`].
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Resolves a session's user id into an [`Actor`]. `None` when the account
    /// no longer exists.
    async fn get_actor(&self, user_id: i32) -> Result<Option<Actor>, AuthError>;
}
