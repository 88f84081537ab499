use latchkey_core::{
    AccessTokenIssuer, Email, Password, PasswordHasher, RefreshTokenStore, TokenPair, UserStore,
};

use crate::{
    error::AuthError,
    token_policy::TokenPolicy,
    use_cases::{
        issue_refresh_token::IssueRefreshTokenUseCase,
        verify_credentials::VerifyCredentialsUseCase,
    },
};

/// Login use case - verifies credentials and starts a session
pub struct LoginUseCase<'a, U, R, H, A>
where
    U: UserStore,
    R: RefreshTokenStore,
    H: PasswordHasher,
    A: AccessTokenIssuer,
{
    user_store: &'a U,
    refresh_token_store: &'a R,
    password_hasher: &'a H,
    access_token_issuer: &'a A,
    policy: TokenPolicy,
}

impl<'a, U, R, H, A> LoginUseCase<'a, U, R, H, A>
where
    U: UserStore,
    R: RefreshTokenStore,
    H: PasswordHasher,
    A: AccessTokenIssuer,
{
    pub fn new(
        user_store: &'a U,
        refresh_token_store: &'a R,
        password_hasher: &'a H,
        access_token_issuer: &'a A,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            user_store,
            refresh_token_store,
            password_hasher,
            access_token_issuer,
            policy,
        }
    }

    /// Execute the login use case
    ///
    /// # Arguments
    /// * `email` - User's email address
    /// * `password` - User's password
    ///
    /// # Returns
    /// A refresh/access token pair, or `AuthFailure`
    #[tracing::instrument(name = "LoginUseCase::execute", skip(self, password))]
    pub async fn execute(&self, email: Email, password: Password) -> Result<TokenPair, AuthError> {
        let user_id = VerifyCredentialsUseCase::new(self.user_store, self.password_hasher)
            .execute(email, password)
            .await?;

        let refresh_token =
            IssueRefreshTokenUseCase::new(self.user_store, self.refresh_token_store, self.policy)
                .execute(user_id)
                .await?;

        let access_token = self
            .access_token_issuer
            .issue(user_id)
            .map_err(AuthError::unexpected)?;

        tracing::info!(%user_id, "User logged in");
        Ok(TokenPair {
            refresh_token,
            access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        MockAccessTokenIssuer, MockPasswordHasher, MockRefreshTokenStore, MockUserStore, email,
        password,
    };
    use crate::use_cases::register::RegisterUseCase;
    use latchkey_core::UserId;

    async fn registered_store() -> MockUserStore {
        let user_store = MockUserStore::default();
        RegisterUseCase::new(&user_store, &MockPasswordHasher)
            .execute(email("test@example.com"), password("password123"))
            .await
            .unwrap();
        user_store
    }

    #[tokio::test]
    async fn test_login_issues_token_pair() {
        let user_store = registered_store().await;
        let token_store = MockRefreshTokenStore::default();
        let use_case = LoginUseCase::new(
            &user_store,
            &token_store,
            &MockPasswordHasher,
            &MockAccessTokenIssuer,
            TokenPolicy::default(),
        );

        let pair = use_case
            .execute(email("test@example.com"), password("password123"))
            .await
            .unwrap();

        assert_eq!(pair.refresh_token.user_id(), UserId::new(1));
        assert_eq!(pair.access_token.as_str(), "access-for-1");
        assert!(token_store.get_token(pair.refresh_token.value()).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let user_store = registered_store().await;
        let token_store = MockRefreshTokenStore::default();
        let use_case = LoginUseCase::new(
            &user_store,
            &token_store,
            &MockPasswordHasher,
            &MockAccessTokenIssuer,
            TokenPolicy::default(),
        );

        let result = use_case
            .execute(email("test@example.com"), password("wrong"))
            .await;
        assert!(matches!(result, Err(AuthError::AuthFailure)));
    }
}
