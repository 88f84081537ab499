use chrono::Utc;
use latchkey_core::{RefreshToken, RefreshTokenStore, UserId, UserStore, UserStoreError};

use crate::{error::AuthError, token_policy::TokenPolicy};

/// Issue refresh token use case - mints and stores a token for a user
pub struct IssueRefreshTokenUseCase<'a, U, R>
where
    U: UserStore,
    R: RefreshTokenStore,
{
    user_store: &'a U,
    refresh_token_store: &'a R,
    policy: TokenPolicy,
}

impl<'a, U, R> IssueRefreshTokenUseCase<'a, U, R>
where
    U: UserStore,
    R: RefreshTokenStore,
{
    pub fn new(user_store: &'a U, refresh_token_store: &'a R, policy: TokenPolicy) -> Self {
        Self {
            user_store,
            refresh_token_store,
            policy,
        }
    }

    /// Execute the issue refresh token use case
    ///
    /// # Returns
    /// The stored token, or `NotFound` when `user_id` has no user
    #[tracing::instrument(name = "IssueRefreshTokenUseCase::execute", skip(self))]
    pub async fn execute(&self, user_id: UserId) -> Result<RefreshToken, AuthError> {
        self.user_store
            .get_user(user_id)
            .await
            .map_err(|e| match e {
                UserStoreError::UserNotFound => AuthError::NotFound,
                other => AuthError::unexpected(other),
            })?;

        let token = RefreshToken::issue(user_id, Utc::now(), self.policy.refresh_token_ttl)
            .map_err(AuthError::unexpected)?;

        self.refresh_token_store
            .add_token(token.clone())
            .await
            .map_err(AuthError::unexpected)?;

        tracing::debug!(expires_at = %token.expires_at(), "Refresh token issued");
        Ok(token)
    }
}
