use latchkey_application::{
    AuthError, FindRefreshTokenUseCase, FindUserUseCase, IssueRefreshTokenUseCase, LoginUseCase,
    LogoutUseCase, RegisterUseCase, RotateRefreshTokenUseCase, TokenPolicy,
    VerifyCredentialsUseCase,
};
use latchkey_core::{
    AccessTokenIssuer, Email, Password, PasswordHasher, RefreshToken, RefreshTokenStore,
    RefreshTokenValue, TokenPair, User, UserId, UserStore,
};
use secrecy::Secret;

/// Entry point to the credential and refresh token operations.
///
/// Raw caller input is validated here; every operation then runs the
/// matching use case against the stores handed to [`AuthService::new`].
pub struct AuthService<U, R, H, A>
where
    U: UserStore,
    R: RefreshTokenStore,
    H: PasswordHasher,
    A: AccessTokenIssuer,
{
    user_store: U,
    refresh_token_store: R,
    password_hasher: H,
    access_token_issuer: A,
    policy: TokenPolicy,
}

impl<U, R, H, A> AuthService<U, R, H, A>
where
    U: UserStore,
    R: RefreshTokenStore,
    H: PasswordHasher,
    A: AccessTokenIssuer,
{
    /// Create a new AuthService with the provided stores and services
    ///
    /// # Arguments
    /// * `user_store` - Store for user records
    /// * `refresh_token_store` - Store for issued refresh tokens
    /// * `password_hasher` - One-way hasher for passwords
    /// * `access_token_issuer` - Mints access tokens on login and rotation
    /// * `policy` - Refresh token lifetime and reuse handling
    pub fn new(
        user_store: U,
        refresh_token_store: R,
        password_hasher: H,
        access_token_issuer: A,
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

    pub fn user_store(&self) -> &U {
        &self.user_store
    }

    pub fn refresh_token_store(&self) -> &R {
        &self.refresh_token_store
    }

    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    pub async fn register(
        &self,
        email: Secret<String>,
        password: Secret<String>,
    ) -> Result<UserId, AuthError> {
        let email = Email::try_from(email)?;
        let password = Password::try_from(password)?;

        RegisterUseCase::new(&self.user_store, &self.password_hasher)
            .execute(email, password)
            .await
    }

    pub async fn find_by_id(&self, user_id: UserId) -> Result<User, AuthError> {
        FindUserUseCase::new(&self.user_store)
            .execute(user_id)
            .await
    }

    /// Malformed input fails the same way as a wrong password.
    pub async fn verify_credentials(
        &self,
        email: Secret<String>,
        password: Secret<String>,
    ) -> Result<UserId, AuthError> {
        let (email, password) = credentials(email, password)?;

        VerifyCredentialsUseCase::new(&self.user_store, &self.password_hasher)
            .execute(email, password)
            .await
    }

    pub async fn find_by_token(&self, token: &str) -> Result<RefreshToken, AuthError> {
        let value = RefreshTokenValue::parse(token)?;

        FindRefreshTokenUseCase::new(&self.refresh_token_store)
            .execute(&value)
            .await
    }

    pub async fn issue_token(&self, user_id: UserId) -> Result<RefreshToken, AuthError> {
        IssueRefreshTokenUseCase::new(&self.user_store, &self.refresh_token_store, self.policy)
            .execute(user_id)
            .await
    }

    pub async fn rotate(&self, token: &str) -> Result<TokenPair, AuthError> {
        let value = RefreshTokenValue::parse(token)?;

        RotateRefreshTokenUseCase::new(
            &self.refresh_token_store,
            &self.access_token_issuer,
            self.policy,
        )
        .execute(&value)
        .await
    }

    pub async fn login(
        &self,
        email: Secret<String>,
        password: Secret<String>,
    ) -> Result<TokenPair, AuthError> {
        let (email, password) = credentials(email, password)?;

        LoginUseCase::new(
            &self.user_store,
            &self.refresh_token_store,
            &self.password_hasher,
            &self.access_token_issuer,
            self.policy,
        )
        .execute(email, password)
        .await
    }

    /// Revoke a single refresh token, returning the user it belonged to.
    pub async fn logout(&self, token: &str) -> Result<UserId, AuthError> {
        let value = RefreshTokenValue::parse(token)?;

        LogoutUseCase::new(&self.refresh_token_store)
            .execute(&value)
            .await
    }

    pub async fn logout_everywhere(&self, user_id: UserId) -> Result<u64, AuthError> {
        LogoutUseCase::new(&self.refresh_token_store)
            .execute_everywhere(user_id)
            .await
    }
}

fn credentials(
    email: Secret<String>,
    password: Secret<String>,
) -> Result<(Email, Password), AuthError> {
    let email = Email::try_from(email).map_err(|_| AuthError::AuthFailure)?;
    let password = Password::try_from(password).map_err(|_| AuthError::AuthFailure)?;
    Ok((email, password))
}
