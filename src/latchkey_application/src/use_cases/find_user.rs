use latchkey_core::{User, UserId, UserStore, UserStoreError};

use crate::error::AuthError;

/// Find user use case - looks a user up by id
pub struct FindUserUseCase<'a, U>
where
    U: UserStore,
{
    user_store: &'a U,
}

impl<'a, U> FindUserUseCase<'a, U>
where
    U: UserStore,
{
    pub fn new(user_store: &'a U) -> Self {
        Self { user_store }
    }

    #[tracing::instrument(name = "FindUserUseCase::execute", skip(self))]
    pub async fn execute(&self, user_id: UserId) -> Result<User, AuthError> {
        self.user_store.get_user(user_id).await.map_err(|e| match e {
            UserStoreError::UserNotFound => AuthError::NotFound,
            other => AuthError::unexpected(other),
        })
    }
}
