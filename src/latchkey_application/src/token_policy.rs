use chrono::Duration;

pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;

/// Refresh-token lifetime rules applied by the issuing and rotating use cases.
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub refresh_token_ttl: Duration,
    /// Revoke every token of a user when one of their rotated tokens is
    /// presented again.
    pub revoke_family_on_reuse: bool,
}

impl TokenPolicy {
    pub fn new(refresh_token_ttl: Duration, revoke_family_on_reuse: bool) -> Self {
        Self {
            refresh_token_ttl,
            revoke_family_on_reuse,
        }
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            refresh_token_ttl: Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECONDS),
            revoke_family_on_reuse: true,
        }
    }
}
