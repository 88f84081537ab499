use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::user_id::UserId;

pub const REFRESH_TOKEN_LENGTH: usize = 64;
const MAX_PRESENTED_TOKEN_LENGTH: usize = 512;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefreshTokenError {
    #[error("Malformed refresh token")]
    Malformed,
    #[error("Unknown token state: {0}")]
    UnknownState(String),
    #[error("Refresh token lifetime out of range")]
    LifetimeOutOfRange,
}

/// Opaque refresh token string. Never printed in full.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RefreshTokenValue(String);

impl RefreshTokenValue {
    /// Generate a fresh value from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let value = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(REFRESH_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        Self(value)
    }

    /// Accept a value presented by a caller. Only the shape is checked here;
    /// whether the token exists is a store question.
    pub fn parse(raw: &str) -> Result<Self, RefreshTokenError> {
        if raw.is_empty()
            || raw.len() > MAX_PRESENTED_TOKEN_LENGTH
            || !raw.bytes().all(|b| b.is_ascii_graphic())
        {
            return Err(RefreshTokenError::Malformed);
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshTokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "RefreshTokenValue({prefix}…)")
    }
}

/// Persisted state of a refresh token. Expiry is derived from time, not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    Active,
    Rotated,
    Revoked,
}

impl TokenState {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenState::Active => "active",
            TokenState::Rotated => "rotated",
            TokenState::Revoked => "revoked",
        }
    }
}

impl FromStr for TokenState {
    type Err = RefreshTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TokenState::Active),
            "rotated" => Ok(TokenState::Rotated),
            "revoked" => Ok(TokenState::Revoked),
            other => Err(RefreshTokenError::UnknownState(other.to_owned())),
        }
    }
}

/// Observable lifecycle status at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Active,
    Rotated,
    Revoked,
    Expired,
}

#[derive(Debug, Clone)]
pub struct RefreshToken {
    value: RefreshTokenValue,
    user_id: UserId,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    state: TokenState,
}

impl RefreshToken {
    /// Mint a new active token for `user_id` living `ttl` from `now`.
    pub fn issue(
        user_id: UserId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, RefreshTokenError> {
        Ok(ReplacementToken::generate(now, ttl)?.bind(user_id))
    }

    /// Rebuild a token read back from storage.
    pub fn restore(
        value: RefreshTokenValue,
        user_id: UserId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        state: TokenState,
    ) -> Self {
        Self {
            value,
            user_id,
            issued_at,
            expires_at,
            state,
        }
    }

    pub fn value(&self) -> &RefreshTokenValue {
        &self.value
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn state(&self) -> TokenState {
        self.state
    }

    pub fn set_state(&mut self, state: TokenState) {
        self.state = state;
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Terminal states win over expiry: a rotated token stays `Rotated`
    /// after its expiry passes, which keeps replay detection working.
    pub fn status(&self, now: DateTime<Utc>) -> TokenStatus {
        match self.state {
            TokenState::Rotated => TokenStatus::Rotated,
            TokenState::Revoked => TokenStatus::Revoked,
            TokenState::Active if self.is_expired(now) => TokenStatus::Expired,
            TokenState::Active => TokenStatus::Active,
        }
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == TokenStatus::Active
    }
}

/// A freshly generated token that is not bound to a user yet. Rotation hands
/// one to the store, which binds it to the owner of the consumed token inside
/// the same atomic step.
#[derive(Debug, Clone)]
pub struct ReplacementToken {
    value: RefreshTokenValue,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl ReplacementToken {
    /// Fails when `now + ttl` falls outside the representable calendar.
    pub fn generate(now: DateTime<Utc>, ttl: Duration) -> Result<Self, RefreshTokenError> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(RefreshTokenError::LifetimeOutOfRange)?;

        Ok(Self {
            value: RefreshTokenValue::generate(),
            issued_at: now,
            expires_at,
        })
    }

    pub fn value(&self) -> &RefreshTokenValue {
        &self.value
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn bind(self, user_id: UserId) -> RefreshToken {
        RefreshToken {
            value: self.value,
            user_id,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            state: TokenState::Active,
        }
    }
}
