use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use latchkey_core::{
    RefreshToken, RefreshTokenStore, RefreshTokenStoreError, RefreshTokenValue, ReplacementToken,
    TokenState, UserId,
};

/// In-memory refresh token store. Rotation holds the write lock across the
/// check, the state change and the insert.
#[derive(Debug, Default, Clone)]
pub struct HashMapRefreshTokenStore {
    tokens: Arc<RwLock<HashMap<RefreshTokenValue, RefreshToken>>>,
}

impl HashMapRefreshTokenStore {
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for HashMapRefreshTokenStore {
    async fn add_token(&self, token: RefreshToken) -> Result<(), RefreshTokenStoreError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(token.value()) {
            return Err(RefreshTokenStoreError::TokenAlreadyExists);
        }
        tokens.insert(token.value().clone(), token);
        Ok(())
    }

    async fn get_token(
        &self,
        value: &RefreshTokenValue,
    ) -> Result<RefreshToken, RefreshTokenStoreError> {
        let tokens = self.tokens.read().await;
        tokens
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
        if tokens.contains_key(replacement.value()) {
            return Err(RefreshTokenStoreError::TokenAlreadyExists);
        }

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

        match token.state() {
            TokenState::Active => {
                token.set_state(TokenState::Revoked);
                Ok(token.clone())
            }
            TokenState::Rotated => Err(RefreshTokenStoreError::TokenAlreadyUsed {
                user_id: token.user_id(),
            }),
            TokenState::Revoked => Err(RefreshTokenStoreError::TokenRevoked),
        }
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RefreshTokenStoreError> {
        let mut tokens = self.tokens.write().await;
        let mut revoked = 0;
        for token in tokens
            .values_mut()
            .filter(|t| t.user_id() == user_id && t.state() == TokenState::Active)
        {
            token.set_state(TokenState::Revoked);
            revoked += 1;
        }
        Ok(revoked)
    }
}
