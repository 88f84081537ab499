pub mod domain;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    access_token::{AccessToken, TokenPair},
    email::Email,
    password::Password,
    password_hash::PasswordHash,
    refresh_token::{
        REFRESH_TOKEN_LENGTH, RefreshToken, RefreshTokenError, RefreshTokenValue,
        ReplacementToken, TokenState, TokenStatus,
    },
    user::{NewUser, User, UserError},
    user_id::UserId,
};

pub use ports::{
    repositories::{RefreshTokenStore, RefreshTokenStoreError, UserStore, UserStoreError},
    services::{AccessTokenError, AccessTokenIssuer, PasswordHasher, PasswordHasherError},
};
