//! Authentication error types.

use thiserror::Error;

use bazaar_core::{EmailError, UsernameError};

use crate::db::RepositoryError;

/// Errors from registration and credential checks.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username failed domain validation.
    #[error("{0}")]
    InvalidUsername(#[from] UsernameError),

    /// Email failed domain validation.
    #[error("{0}")]
    InvalidEmail(#[from] EmailError),

    /// Password failed the strength rule set.
    #[error("{0}")]
    WeakPassword(String),

    /// Username is already registered.
    #[error("username already registered")]
    UsernameTaken,

    /// Email is already registered.
    #[error("email already registered")]
    EmailTaken,

    /// Username/password pair did not match. Deliberately uninformative.
    #[error("could not authenticate the user")]
    InvalidCredentials,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Database operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
