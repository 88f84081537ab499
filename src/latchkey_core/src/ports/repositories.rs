use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    email::Email,
    refresh_token::{RefreshToken, RefreshTokenValue, ReplacementToken},
    user::{NewUser, User},
    user_id::UserId,
};

// UserStore port trait and errors
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("User not found")]
    UserNotFound,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for UserStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::UserAlreadyExists, Self::UserAlreadyExists)
                | (Self::UserNotFound, Self::UserNotFound)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a user whose password is already hashed and return the
    /// assigned id. Fails with `UserAlreadyExists` on a duplicate email.
    async fn add_user(&self, user: NewUser) -> Result<UserId, UserStoreError>;
    async fn get_user(&self, id: UserId) -> Result<User, UserStoreError>;
    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError>;
}

// RefreshTokenStore port trait and errors
#[derive(Debug, Error)]
pub enum RefreshTokenStoreError {
    #[error("Refresh token already exists")]
    TokenAlreadyExists,
    #[error("Refresh token not found")]
    TokenNotFound,
    #[error("Refresh token expired")]
    TokenExpired,
    #[error("Refresh token was already rotated")]
    TokenAlreadyUsed { user_id: UserId },
    #[error("Refresh token was revoked")]
    TokenRevoked,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for RefreshTokenStoreError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::TokenAlreadyUsed { user_id: a }, Self::TokenAlreadyUsed { user_id: b }) => {
                a == b
            }
            _ => matches!(
                (self, other),
                (Self::TokenAlreadyExists, Self::TokenAlreadyExists)
                    | (Self::TokenNotFound, Self::TokenNotFound)
                    | (Self::TokenExpired, Self::TokenExpired)
                    | (Self::TokenRevoked, Self::TokenRevoked)
                    | (Self::UnexpectedError(_), Self::UnexpectedError(_))
            ),
        }
    }
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn add_token(&self, token: RefreshToken) -> Result<(), RefreshTokenStoreError>;

    /// Read a token in whatever state it is in.
    async fn get_token(
        &self,
        value: &RefreshTokenValue,
    ) -> Result<RefreshToken, RefreshTokenStoreError>;

    /// Consume `old` and persist `replacement` for the same user as one
    /// atomic step. `replacement.issued_at()` is the instant expiry is
    /// judged against. Exactly one of any set of concurrent calls with the
    /// same `old` value may succeed.
    async fn rotate_token(
        &self,
        old: &RefreshTokenValue,
        replacement: ReplacementToken,
    ) -> Result<RefreshToken, RefreshTokenStoreError>;

    /// Move an active token to `Revoked` and return it.
    async fn revoke_token(
        &self,
        value: &RefreshTokenValue,
    ) -> Result<RefreshToken, RefreshTokenStoreError>;

    /// Revoke every active token of `user_id`, returning how many changed.
    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RefreshTokenStoreError>;
}
