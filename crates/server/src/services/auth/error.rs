//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] coursehub_core::EmailError),

    /// Username fails validation.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// Signup requested a role that cannot be self-assigned.
    #[error("role cannot be self-assigned")]
    RoleNotAllowed,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Username or email already registered.
    #[error("account already exists: {0}")]
    AlreadyExists(String),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::UserNotFound => StatusCode::UNAUTHORIZED,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::InvalidEmail(_)
            | Self::InvalidUsername(_)
            | Self::RoleNotAllowed
            | Self::WeakPassword(_) => StatusCode::BAD_REQUEST,
            Self::Repository(_) | Self::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; internals stay server-side.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            // Same message for bad password and unknown user, so the login
            // endpoint can't be used to enumerate accounts.
            Self::InvalidCredentials | Self::UserNotFound => "Invalid credentials".to_string(),
            Self::AlreadyExists(msg) => msg.clone(),
            Self::InvalidEmail(_) => "Invalid email address".to_string(),
            Self::InvalidUsername(msg) | Self::WeakPassword(msg) => msg.clone(),
            Self::RoleNotAllowed => "That role cannot be chosen at signup".to_string(),
            Self::Repository(_) | Self::PasswordHash => "Internal server error".to_string(),
        }
    }
}
