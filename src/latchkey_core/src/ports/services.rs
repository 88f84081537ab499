use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    access_token::AccessToken, password::Password, password_hash::PasswordHash, user_id::UserId,
};

#[derive(Debug, Error)]
pub enum PasswordHasherError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Port for a one-way adaptive hash primitive.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: Password) -> Result<PasswordHash, PasswordHasherError>;

    /// Returns `Ok(false)` on mismatch; errors are reserved for unusable
    /// hashes or runtime failures.
    async fn verify(
        &self,
        candidate: Password,
        expected: &PasswordHash,
    ) -> Result<bool, PasswordHasherError>;

    /// Spend the same work as `verify` against a throwaway hash, for code
    /// paths where no stored hash exists.
    async fn verify_dummy(&self, candidate: Password) -> Result<(), PasswordHasherError>;
}

#[derive(Debug, Error)]
pub enum AccessTokenError {
    #[error("Failed to sign access token: {0}")]
    SigningFailed(String),
    #[error("Invalid access token")]
    InvalidToken,
    #[error("Access token expired")]
    Expired,
}

/// Port for minting short-lived access tokens.
pub trait AccessTokenIssuer: Send + Sync {
    fn issue(&self, user_id: UserId) -> Result<AccessToken, AccessTokenError>;
}
