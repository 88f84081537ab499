use thiserror::Error;

use super::{email::Email, password_hash::PasswordHash, user_id::UserId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must not be empty")]
    EmptyPassword,
    #[error("Password must be at most {0} bytes")]
    PasswordTooLong(usize),
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),
}

/// A registered user. The password is only ever held as a digest.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    email: Email,
    password_hash: PasswordHash,
}

impl User {
    pub fn new(id: UserId, email: Email, password_hash: PasswordHash) -> Self {
        Self {
            id,
            email,
            password_hash,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }
}

/// A user that has not been persisted yet and so has no id.
#[derive(Debug, Clone)]
pub struct NewUser {
    email: Email,
    password_hash: PasswordHash,
}

impl NewUser {
    pub fn new(email: Email, password_hash: PasswordHash) -> Self {
        Self {
            email,
            password_hash,
        }
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn with_id(self, id: UserId) -> User {
        User::new(id, self.email, self.password_hash)
    }
}
