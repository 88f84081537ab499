use std::fmt::Display;

use latchkey_core::{RefreshTokenError, UserError};

/// Error taxonomy shared by every use case.
///
/// `AuthFailure` deliberately covers both "no such user" and "wrong
/// password" so callers cannot enumerate registered emails.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not found")]
    NotFound,
    #[error("Identifier already registered")]
    DuplicateIdentifier,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    Expired,
    #[error("Authentication failed")]
    AuthFailure,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AuthError {
    pub(crate) fn unexpected(error: impl Display) -> Self {
        tracing::error!(error = %error, "Unexpected failure in auth core");
        AuthError::Unexpected(error.to_string())
    }
}

impl From<UserError> for AuthError {
    fn from(error: UserError) -> Self {
        AuthError::InvalidInput(error.to_string())
    }
}

// A malformed refresh token is indistinguishable from an unknown one.
impl From<RefreshTokenError> for AuthError {
    fn from(_: RefreshTokenError) -> Self {
        AuthError::InvalidToken
    }
}
