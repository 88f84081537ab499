use chrono::Utc;
use latchkey_core::{RefreshToken, RefreshTokenStore, RefreshTokenStoreError, RefreshTokenValue};

use crate::error::AuthError;

/// Find refresh token use case - validates a presented refresh token
pub struct FindRefreshTokenUseCase<'a, R>
where
    R: RefreshTokenStore,
{
    refresh_token_store: &'a R,
}

impl<'a, R> FindRefreshTokenUseCase<'a, R>
where
    R: RefreshTokenStore,
{
    pub fn new(refresh_token_store: &'a R) -> Self {
        Self {
            refresh_token_store,
        }
    }

    /// Returns the token only while it is usable. Unknown, rotated, revoked
    /// and expired tokens all fail with `InvalidToken`.
    #[tracing::instrument(name = "FindRefreshTokenUseCase::execute", skip(self, value))]
    pub async fn execute(&self, value: &RefreshTokenValue) -> Result<RefreshToken, AuthError> {
        let token = self
            .refresh_token_store
            .get_token(value)
            .await
            .map_err(|e| match e {
                RefreshTokenStoreError::TokenNotFound => AuthError::InvalidToken,
                other => AuthError::unexpected(other),
            })?;

        if !token.is_usable(Utc::now()) {
            return Err(AuthError::InvalidToken);
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockRefreshTokenStore;
    use chrono::Duration;
    use latchkey_core::{TokenState, UserId};

    #[tokio::test]
    async fn test_find_active_token() {
        let store = MockRefreshTokenStore::default();
        let token = RefreshToken::issue(UserId::new(1), Utc::now(), Duration::hours(1)).unwrap();
        store.add_token(token.clone()).await.unwrap();

        let found = FindRefreshTokenUseCase::new(&store)
            .execute(token.value())
            .await
            .unwrap();
        assert_eq!(found.user_id(), UserId::new(1));
        assert_eq!(found.value(), token.value());
    }

    #[tokio::test]
    async fn test_find_never_issued_token() {
        let store = MockRefreshTokenStore::default();

        let result = FindRefreshTokenUseCase::new(&store)
            .execute(&RefreshTokenValue::generate())
            .await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_find_expired_token() {
        let store = MockRefreshTokenStore::default();
        let token = RefreshToken::issue(UserId::new(1), Utc::now(), Duration::zero()).unwrap();
        store.add_token(token.clone()).await.unwrap();

        let result = FindRefreshTokenUseCase::new(&store)
            .execute(token.value())
            .await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_find_revoked_token() {
        let store = MockRefreshTokenStore::default();
        let mut token = RefreshToken::issue(UserId::new(1), Utc::now(), Duration::hours(1)).unwrap();
        token.set_state(TokenState::Revoked);
        store.add_token(token.clone()).await.unwrap();

        let result = FindRefreshTokenUseCase::new(&store)
            .execute(token.value())
            .await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }
}
