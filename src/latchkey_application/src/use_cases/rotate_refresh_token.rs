use chrono::Utc;
use latchkey_core::{
    AccessTokenIssuer, RefreshTokenStore, RefreshTokenStoreError, RefreshTokenValue,
    ReplacementToken, TokenPair, UserId,
};

use crate::{error::AuthError, token_policy::TokenPolicy};

/// Rotate refresh token use case - exchanges a refresh token for a new pair
///
/// The old token is consumed and the replacement stored in a single store
/// call, so a given token can be rotated at most once.
pub struct RotateRefreshTokenUseCase<'a, R, A>
where
    R: RefreshTokenStore,
    A: AccessTokenIssuer,
{
    refresh_token_store: &'a R,
    access_token_issuer: &'a A,
    policy: TokenPolicy,
}

impl<'a, R, A> RotateRefreshTokenUseCase<'a, R, A>
where
    R: RefreshTokenStore,
    A: AccessTokenIssuer,
{
    pub fn new(refresh_token_store: &'a R, access_token_issuer: &'a A, policy: TokenPolicy) -> Self {
        Self {
            refresh_token_store,
            access_token_issuer,
            policy,
        }
    }

    /// Execute the rotate refresh token use case
    ///
    /// # Returns
    /// A fresh refresh/access token pair, `Expired` for a token past its
    /// lifetime, or `InvalidToken` for unknown, revoked or already rotated
    /// tokens
    #[tracing::instrument(name = "RotateRefreshTokenUseCase::execute", skip(self, old))]
    pub async fn execute(&self, old: &RefreshTokenValue) -> Result<TokenPair, AuthError> {
        let replacement = ReplacementToken::generate(Utc::now(), self.policy.refresh_token_ttl)
            .map_err(AuthError::unexpected)?;

        let refresh_token = match self
            .refresh_token_store
            .rotate_token(old, replacement)
            .await
        {
            Ok(token) => token,
            Err(RefreshTokenStoreError::TokenExpired) => return Err(AuthError::Expired),
            Err(RefreshTokenStoreError::TokenAlreadyUsed { user_id }) => {
                self.handle_reuse(user_id).await?;
                return Err(AuthError::InvalidToken);
            }
            Err(RefreshTokenStoreError::TokenNotFound | RefreshTokenStoreError::TokenRevoked) => {
                return Err(AuthError::InvalidToken);
            }
            Err(e) => return Err(AuthError::unexpected(e)),
        };

        let access_token = self
            .access_token_issuer
            .issue(refresh_token.user_id())
            .map_err(AuthError::unexpected)?;

        Ok(TokenPair {
            refresh_token,
            access_token,
        })
    }

    /// A rotated token showing up again means it leaked; drop every session
    /// the user still has.
    async fn handle_reuse(&self, user_id: UserId) -> Result<(), AuthError> {
        if !self.policy.revoke_family_on_reuse {
            tracing::warn!(%user_id, "Rotated refresh token presented again");
            return Ok(());
        }

        let revoked = self
            .refresh_token_store
            .revoke_all_for_user(user_id)
            .await
            .map_err(AuthError::unexpected)?;

        tracing::warn!(
            %user_id,
            revoked,
            "Rotated refresh token presented again, revoked all sessions"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockAccessTokenIssuer, MockRefreshTokenStore};
    use chrono::Duration;
    use latchkey_core::{RefreshToken, TokenState};

    async fn store_with_token(ttl: Duration) -> (MockRefreshTokenStore, RefreshToken) {
        let store = MockRefreshTokenStore::default();
        let token = RefreshToken::issue(UserId::new(1), Utc::now(), ttl).unwrap();
        store.add_token(token.clone()).await.unwrap();
        (store, token)
    }

    #[tokio::test]
    async fn test_rotate_returns_new_pair_for_same_user() {
        let (store, token) = store_with_token(Duration::hours(1)).await;
        let use_case =
            RotateRefreshTokenUseCase::new(&store, &MockAccessTokenIssuer, TokenPolicy::default());

        let pair = use_case.execute(token.value()).await.unwrap();

        assert_eq!(pair.refresh_token.user_id(), UserId::new(1));
        assert_ne!(pair.refresh_token.value(), token.value());
        assert_eq!(pair.access_token.as_str(), "access-for-1");
        assert_eq!(store.state_of(token.value()).await, Some(TokenState::Rotated));
    }

    #[tokio::test]
    async fn test_rotate_is_single_use() {
        let (store, token) = store_with_token(Duration::hours(1)).await;
        let use_case =
            RotateRefreshTokenUseCase::new(&store, &MockAccessTokenIssuer, TokenPolicy::default());

        assert!(use_case.execute(token.value()).await.is_ok());
        let second = use_case.execute(token.value()).await;
        assert!(matches!(second, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_reuse_revokes_the_whole_family() {
        let (store, token) = store_with_token(Duration::hours(1)).await;
        let use_case =
            RotateRefreshTokenUseCase::new(&store, &MockAccessTokenIssuer, TokenPolicy::default());

        let pair = use_case.execute(token.value()).await.unwrap();
        let _ = use_case.execute(token.value()).await;

        assert_eq!(
            store.state_of(pair.refresh_token.value()).await,
            Some(TokenState::Revoked)
        );
    }

    #[tokio::test]
    async fn test_reuse_keeps_family_when_policy_disabled() {
        let (store, token) = store_with_token(Duration::hours(1)).await;
        let policy = TokenPolicy::new(Duration::hours(1), false);
        let use_case = RotateRefreshTokenUseCase::new(&store, &MockAccessTokenIssuer, policy);

        let pair = use_case.execute(token.value()).await.unwrap();
        let second = use_case.execute(token.value()).await;

        assert!(matches!(second, Err(AuthError::InvalidToken)));
        assert_eq!(
            store.state_of(pair.refresh_token.value()).await,
            Some(TokenState::Active)
        );
    }

    #[tokio::test]
    async fn test_rotate_expired_token() {
        let (store, token) = store_with_token(Duration::zero()).await;
        let use_case =
            RotateRefreshTokenUseCase::new(&store, &MockAccessTokenIssuer, TokenPolicy::default());

        let result = use_case.execute(token.value()).await;
        assert!(matches!(result, Err(AuthError::Expired)));
        assert_eq!(store.state_of(token.value()).await, Some(TokenState::Active));
    }

    #[tokio::test]
    async fn test_rotate_with_out_of_range_ttl_keeps_old_token() {
        let (store, token) = store_with_token(Duration::hours(1)).await;
        let policy = TokenPolicy::new(Duration::seconds(100_000_000_000_000), true);
        let use_case = RotateRefreshTokenUseCase::new(&store, &MockAccessTokenIssuer, policy);

        let result = use_case.execute(token.value()).await;

        assert!(matches!(result, Err(AuthError::Unexpected(_))));
        assert_eq!(store.state_of(token.value()).await, Some(TokenState::Active));
    }

    #[tokio::test]
    async fn test_rotate_unknown_token() {
        let store = MockRefreshTokenStore::default();
        let use_case =
            RotateRefreshTokenUseCase::new(&store, &MockAccessTokenIssuer, TokenPolicy::default());

        let result = use_case.execute(&RefreshTokenValue::generate()).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_concurrent_rotations_have_one_winner() {
        let (store, token) = store_with_token(Duration::hours(1)).await;
        let use_case =
            RotateRefreshTokenUseCase::new(&store, &MockAccessTokenIssuer, TokenPolicy::default());

        let (a, b) = tokio::join!(use_case.execute(token.value()), use_case.execute(token.value()));

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    }
}
