use latchkey_core::{RefreshTokenStore, RefreshTokenStoreError, RefreshTokenValue, UserId};

use crate::error::AuthError;

/// Logout use case - revokes refresh tokens
pub struct LogoutUseCase<'a, R>
where
    R: RefreshTokenStore,
{
    refresh_token_store: &'a R,
}

impl<'a, R> LogoutUseCase<'a, R>
where
    R: RefreshTokenStore,
{
    pub fn new(refresh_token_store: &'a R) -> Self {
        Self {
            refresh_token_store,
        }
    }

    /// Revoke a single active refresh token
    #[tracing::instrument(name = "LogoutUseCase::execute", skip(self, token))]
    pub async fn execute(&self, token: &RefreshTokenValue) -> Result<UserId, AuthError> {
        let revoked = self
            .refresh_token_store
            .revoke_token(token)
            .await
            .map_err(|e| match e {
                RefreshTokenStoreError::TokenNotFound
                | RefreshTokenStoreError::TokenRevoked
                | RefreshTokenStoreError::TokenAlreadyUsed { .. } => AuthError::InvalidToken,
                other => AuthError::unexpected(other),
            })?;

        tracing::info!(user_id = %revoked.user_id(), "Refresh token revoked");
        Ok(revoked.user_id())
    }

    /// Revoke every active refresh token of a user
    #[tracing::instrument(name = "LogoutUseCase::execute_everywhere", skip(self))]
    pub async fn execute_everywhere(&self, user_id: UserId) -> Result<u64, AuthError> {
        let revoked = self
            .refresh_token_store
            .revoke_all_for_user(user_id)
            .await
            .map_err(AuthError::unexpected)?;

        tracing::info!(%user_id, revoked, "All refresh tokens revoked");
        Ok(revoked)
    }
}
