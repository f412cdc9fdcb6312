//! Authentication error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] neemon_core::EmailError),

    /// A required field was blank.
    #[error("{0}")]
    MissingField(&'static str),

    /// Password too short.
    #[error("Password should be at least {0} characters.")]
    WeakPassword(usize),

    /// Another local account already uses this email (case-insensitive).
    #[error("Email already registered")]
    DuplicateEmail,

    /// Unknown email or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password reset for an email with no local account.
    #[error("Email not found")]
    EmailNotFound,

    /// Operation requires a signed-in user.
    #[error("not signed in")]
    NotAuthenticated,

    /// Identity provider rejected the request; the message is shown as-is.
    #[error("{0}")]
    Provider(String),

    /// Local store write failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
