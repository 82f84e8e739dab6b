//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::error::ErrorKind;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    /// Invalid phone number.
    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] bazaar_core::PhoneError),

    /// Name is blank.
    #[error("name cannot be empty")]
    InvalidName,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Email or phone already registered.
    #[error("{0}")]
    UserAlreadyExists(String),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Token missing, malformed, forged or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Token could not be produced.
    #[error("token error: {0}")]
    Token(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Classify the error for the HTTP boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEmail(_)
            | Self::InvalidPhone(_)
            | Self::InvalidName
            | Self::WeakPassword(_) => ErrorKind::InvalidArgument,
            Self::InvalidCredentials | Self::InvalidToken => ErrorKind::Unauthorized,
            Self::UserNotFound => ErrorKind::NotFound,
            Self::UserAlreadyExists(_) => ErrorKind::Conflict,
            Self::Token(_) | Self::PasswordHash => ErrorKind::Internal,
            Self::Repository(err) => err.kind(),
        }
    }
}
