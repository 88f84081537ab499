use secrecy::{ExposeSecret, Secret};

use super::user::UserError;

const MAX_PASSWORD_BYTES: usize = 1024;

/// A plaintext password candidate. Only ever handed to a `PasswordHasher`.
#[derive(Debug, Clone)]
pub struct Password(Secret<String>);

impl Password {
    pub fn parse(raw: Secret<String>) -> Result<Self, UserError> {
        let len = raw.expose_secret().len();
        if len == 0 {
            return Err(UserError::EmptyPassword);
        }
        if len > MAX_PASSWORD_BYTES {
            return Err(UserError::PasswordTooLong(MAX_PASSWORD_BYTES));
        }
        Ok(Self(raw))
    }
}

impl TryFrom<Secret<String>> for Password {
    type Error = UserError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<Secret<String>> for Password {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}
