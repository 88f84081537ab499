use latchkey_core::{Email, Password, PasswordHasher, UserId, UserStore, UserStoreError};

use crate::error::AuthError;

/// Verify credentials use case - checks an email/password pair
pub struct VerifyCredentialsUseCase<'a, U, H>
where
    U: UserStore,
    H: PasswordHasher,
{
    user_store: &'a U,
    password_hasher: &'a H,
}

impl<'a, U, H> VerifyCredentialsUseCase<'a, U, H>
where
    U: UserStore,
    H: PasswordHasher,
{
    pub fn new(user_store: &'a U, password_hasher: &'a H) -> Self {
        Self {
            user_store,
            password_hasher,
        }
    }

    /// Execute the verify credentials use case
    ///
    /// An unknown email and a wrong password both yield `AuthFailure`, and
    /// both paths run one hash verification.
    #[tracing::instrument(name = "VerifyCredentialsUseCase::execute", skip(self, password))]
    pub async fn execute(&self, email: Email, password: Password) -> Result<UserId, AuthError> {
        let user = match self.user_store.get_user_by_email(&email).await {
            Ok(user) => user,
            Err(UserStoreError::UserNotFound) => {
                self.password_hasher
                    .verify_dummy(password)
                    .await
                    .map_err(AuthError::unexpected)?;
                tracing::debug!("Credential check failed");
                return Err(AuthError::AuthFailure);
            }
            Err(e) => return Err(AuthError::unexpected(e)),
        };

        let matches = self
            .password_hasher
            .verify(password, user.password_hash())
            .await
            .map_err(AuthError::unexpected)?;

        if !matches {
            tracing::debug!("Credential check failed");
            return Err(AuthError::AuthFailure);
        }

        Ok(user.id())
    }
}
