use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};

use super::refresh_token::RefreshToken;

/// Short-lived signed credential handed out next to a refresh token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    token: Secret<String>,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: Secret<String>, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    pub fn as_str(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// What a successful login or rotation returns.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub refresh_token: RefreshToken,
    pub access_token: AccessToken,
}
