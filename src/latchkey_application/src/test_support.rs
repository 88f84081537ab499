//! In-memory port implementations shared by the use-case tests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use latchkey_core::{
    AccessToken, AccessTokenError, AccessTokenIssuer, Email, NewUser, Password, PasswordHash,
    PasswordHasher, PasswordHasherError, RefreshToken, RefreshTokenStore, RefreshTokenStoreError,
    RefreshTokenValue, ReplacementToken, TokenState, User, UserId, UserStore, UserStoreError,
};
use secrecy::{ExposeSecret, Secret};
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct MockUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

#[async_trait::async_trait]
impl UserStore for MockUserStore {
    async fn add_user(&self, user: NewUser) -> Result<UserId, UserStoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email() == user.email()) {
            return Err(UserStoreError::UserAlreadyExists);
        }
        let id = UserId::new(users.len() as i64 + 1);
        users.insert(id, user.with_id(id));
        Ok(id)
    }

    async fn get_user(&self, id: UserId) -> Result<User, UserStoreError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email() == email)
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }
}

#[derive(Clone, Default)]
pub struct MockRefreshTokenStore {
    tokens: Arc<RwLock<HashMap<RefreshTokenValue, RefreshToken>>>,
}

impl MockRefreshTokenStore {
    pub async fn state_of(&self, value: &RefreshTokenValue) -> Option<TokenState> {
        self.tokens.read().await.get(value).map(|t| t.state())
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MockRefreshTokenStore {
    async fn add_token(&self, token: RefreshToken) -> Result<(), RefreshTokenStoreError> {
        self.tokens
            .write()
            .await
            .insert(token.value().clone(), token);
        Ok(())
    }

    async fn get_token(
        &self,
        value: &RefreshTokenValue,
    ) -> Result<RefreshToken, RefreshTokenStoreError> {
        self.tokens
            .read()
            .await
            .get(value)
            .cloned()
            .ok_or(RefreshTokenStoreError::TokenNotFound)
    }

    async fn rotate_token(
        &self,
        old: &RefreshTokenValue,
        replacement: ReplacementToken,
    ) -> Result<RefreshToken, RefreshTokenStoreError> {
        let mut tokens = self.tokens.write().await;
        let current = tokens
            .get_mut(old)
            .ok_or(RefreshTokenStoreError::TokenNotFound)?;
        match current.state() {
            TokenState::Rotated => {
                return Err(RefreshTokenStoreError::TokenAlreadyUsed {
                    user_id: current.user_id(),
                });
            }
            TokenState::Revoked => return Err(RefreshTokenStoreError::TokenRevoked),
            TokenState::Active if current.is_expired(replacement.issued_at()) => {
                return Err(RefreshTokenStoreError::TokenExpired);
            }
            TokenState::Active => {}
        }
        current.set_state(TokenState::Rotated);
        let next = replacement.bind(current.user_id());
        tokens.insert(next.value().clone(), next.clone());
        Ok(next)
    }

    async fn revoke_token(
        &self,
        value: &RefreshTokenValue,
    ) -> Result<RefreshToken, RefreshTokenStoreError> {
        let mut tokens = self.tokens.write().await;
        let token = tokens
            .get_mut(value)
            .ok_or(RefreshTokenStoreError::TokenNotFound)?;
        if token.state() != TokenState::Active {
            return Err(RefreshTokenStoreError::TokenRevoked);
        }
        token.set_state(TokenState::Revoked);
        Ok(token.clone())
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RefreshTokenStoreError> {
        let mut tokens = self.tokens.write().await;
        let mut revoked = 0;
        for token in tokens.values_mut() {
            if token.user_id() == user_id && token.state() == TokenState::Active {
                token.set_state(TokenState::Revoked);
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}

/// Reversible stand-in for a real hash; good enough to test control flow.
#[derive(Clone, Default)]
pub struct MockPasswordHasher;

#[async_trait::async_trait]
impl PasswordHasher for MockPasswordHasher {
    async fn hash(&self, password: Password) -> Result<PasswordHash, PasswordHasherError> {
        Ok(PasswordHash::new(Secret::new(format!(
            "mock${}",
            password.as_ref().expose_secret()
        ))))
    }

    async fn verify(
        &self,
        candidate: Password,
        expected: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(expected.as_str() == format!("mock${}", candidate.as_ref().expose_secret()))
    }

    async fn verify_dummy(&self, _candidate: Password) -> Result<(), PasswordHasherError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockAccessTokenIssuer;

impl AccessTokenIssuer for MockAccessTokenIssuer {
    fn issue(&self, user_id: UserId) -> Result<AccessToken, AccessTokenError> {
        Ok(AccessToken::new(
            Secret::new(format!("access-for-{user_id}")),
            Utc::now() + Duration::minutes(15),
        ))
    }
}

pub fn email(raw: &str) -> Email {
    Email::parse(raw).unwrap()
}

pub fn password(raw: &str) -> Password {
    Password::try_from(Secret::new(raw.to_owned())).unwrap()
}
