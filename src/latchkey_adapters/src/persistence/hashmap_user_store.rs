use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use latchkey_core::{Email, NewUser, User, UserId, UserStore, UserStoreError};

#[derive(Default)]
struct Users {
    by_id: HashMap<UserId, User>,
    by_email: HashMap<Email, UserId>,
    last_id: i64,
}

#[derive(Default, Clone)]
pub struct HashMapUserStore {
    users: Arc<RwLock<Users>>,
}

impl HashMapUserStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(Users::default())),
        }
    }
}

#[async_trait::async_trait]
impl UserStore for HashMapUserStore {
    async fn add_user(&self, user: NewUser) -> Result<UserId, UserStoreError> {
        let mut users = self.users.write().await;
        if users.by_email.contains_key(user.email()) {
            return Err(UserStoreError::UserAlreadyExists);
        }
        users.last_id += 1;
        let id = UserId::new(users.last_id);
        users.by_email.insert(user.email().clone(), id);
        users.by_id.insert(id, user.with_id(id));
        Ok(id)
    }

    async fn get_user(&self, id: UserId) -> Result<User, UserStoreError> {
        let users = self.users.read().await;
        users
            .by_id
            .get(&id)
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        let users = self.users.read().await;
        users
            .by_email
            .get(email)
            .and_then(|id| users.by_id.get(id))
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_core::PasswordHash;
    use secrecy::Secret;

    fn new_user(email: &str) -> NewUser {
        NewUser::new(
            Email::parse(email).unwrap(),
            PasswordHash::new(Secret::new("$argon2id$stub".to_owned())),
        )
    }

    #[tokio::test]
    async fn test_add_user_assigns_sequential_ids() {
        let store = HashMapUserStore::new();
        assert_eq!(store.add_user(new_user("a@x.com")).await, Ok(UserId::new(1)));
        assert_eq!(store.add_user(new_user("b@x.com")).await, Ok(UserId::new(2)));
    }

    #[tokio::test]
    async fn test_add_duplicate_email() {
        let store = HashMapUserStore::new();
        store.add_user(new_user("a@x.com")).await.unwrap();

        let result = store.add_user(new_user("a@x.com")).await;
        assert_eq!(result, Err(UserStoreError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_get_user_by_id_and_email() {
        let store = HashMapUserStore::new();
        let id = store.add_user(new_user("a@x.com")).await.unwrap();

        let by_id = store.get_user(id).await.unwrap();
        let by_email = store
            .get_user_by_email(&Email::parse("a@x.com").unwrap())
            .await
            .unwrap();
        assert_eq!(by_id.id(), by_email.id());
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let store = HashMapUserStore::new();
        assert_eq!(
            store.get_user(UserId::new(9)).await.unwrap_err(),
            UserStoreError::UserNotFound
        );
        assert_eq!(
            store
                .get_user_by_email(&Email::parse("nobody@x.com").unwrap())
                .await
                .unwrap_err(),
            UserStoreError::UserNotFound
        );
    }
}
