use latchkey_core::{Email, NewUser, Password, PasswordHasher, UserId, UserStore, UserStoreError};

use crate::error::AuthError;

/// Register use case - hashes the password and stores a new user
pub struct RegisterUseCase<'a, U, H>
where
    U: UserStore,
    H: PasswordHasher,
{
    user_store: &'a U,
    password_hasher: &'a H,
}

impl<'a, U, H> RegisterUseCase<'a, U, H>
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

    /// Execute the register use case
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `password` - Plaintext password, consumed by the hasher
    ///
    /// # Returns
    /// The new user's id, or `DuplicateIdentifier` if the email is taken
    #[tracing::instrument(name = "RegisterUseCase::execute", skip(self, password))]
    pub async fn execute(&self, email: Email, password: Password) -> Result<UserId, AuthError> {
        let password_hash = self
            .password_hasher
            .hash(password)
            .await
            .map_err(AuthError::unexpected)?;

        let user_id = self
            .user_store
            .add_user(NewUser::new(email, password_hash))
            .await
            .map_err(|e| match e {
                UserStoreError::UserAlreadyExists => AuthError::DuplicateIdentifier,
                other => AuthError::unexpected(other),
            })?;

        tracing::info!(%user_id, "User registered");
        Ok(user_id)
    }
}
