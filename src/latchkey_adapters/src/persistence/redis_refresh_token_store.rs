use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Duration, Utc};
use latchkey_core::{
    RefreshToken, RefreshTokenStore, RefreshTokenStoreError, RefreshTokenValue, ReplacementToken,
    TokenState, UserId,
};
use redis::{Commands, Connection, Script};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

// Terminal and expired tokens stay readable this long past expiry so that
// replays and late rotations are still classified correctly.
const RETENTION_AFTER_EXPIRY: Duration = Duration::days(1);

/// Redis refresh token store. State transitions run as Lua scripts, which
/// Redis executes atomically.
#[derive(Clone)]
pub struct RedisRefreshTokenStore {
    conn: Arc<RwLock<Connection>>,
}

impl RedisRefreshTokenStore {
    pub fn new(conn: Arc<RwLock<Connection>>) -> Self {
        Self { conn }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    user_id: i64,
    state: TokenState,
    #[serde(with = "chrono::serde::ts_seconds")]
    issued_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    expires_at: DateTime<Utc>,
}

impl TokenRecord {
    fn from_token(token: &RefreshToken) -> Self {
        Self {
            user_id: token.user_id().get(),
            state: token.state(),
            issued_at: token.issued_at(),
            expires_at: token.expires_at(),
        }
    }

    fn into_token(self, value: RefreshTokenValue) -> RefreshToken {
        RefreshToken::restore(
            value,
            UserId::new(self.user_id),
            self.issued_at,
            self.expires_at,
            self.state,
        )
    }
}

fn encode(record: &TokenRecord) -> Result<String, RefreshTokenStoreError> {
    serde_json::to_string(record).map_err(|e| RefreshTokenStoreError::UnexpectedError(e.to_string()))
}

fn decode(raw: &str) -> Result<TokenRecord, RefreshTokenStoreError> {
    serde_json::from_str(raw).map_err(|e| RefreshTokenStoreError::UnexpectedError(e.to_string()))
}

fn retention_millis(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((expires_at - now).max(Duration::zero()) + RETENTION_AFTER_EXPIRY).num_milliseconds()
}

fn redis_error(e: redis::RedisError) -> RefreshTokenStoreError {
    tracing::error!("Redis error: {e}");
    RefreshTokenStoreError::UnexpectedError(e.to_string())
}

/// Map a script's refusal code onto a store error.
fn refusal(reply: &[String]) -> RefreshTokenStoreError {
    match reply.first().map(String::as_str) {
        Some("missing") => RefreshTokenStoreError::TokenNotFound,
        Some("revoked") => RefreshTokenStoreError::TokenRevoked,
        Some("expired") => RefreshTokenStoreError::TokenExpired,
        Some("duplicate") => RefreshTokenStoreError::TokenAlreadyExists,
        Some("rotated") => match reply.get(1).and_then(|id| id.parse::<i64>().ok()) {
            Some(user_id) => RefreshTokenStoreError::TokenAlreadyUsed {
                user_id: UserId::new(user_id),
            },
            None => RefreshTokenStoreError::UnexpectedError("Malformed script reply".to_owned()),
        },
        _ => RefreshTokenStoreError::UnexpectedError(format!("Unexpected script reply {reply:?}")),
    }
}

// Every key a script touches is passed in KEYS so the scripts stay valid
// under Redis Cluster slot checks.

// KEYS[1] token, KEYS[2] user index
// ARGV[1] record, ARGV[2] TTL (ms), ARGV[3] token value
const ADD_LUA: &str = r#"
    local stored = redis.call('SET', KEYS[1], ARGV[1], 'PX', ARGV[2], 'NX')
    if not stored then return {'duplicate'} end
    redis.call('SADD', KEYS[2], ARGV[3])
    return {'ok'}
"#;

// KEYS[1] old token, KEYS[2] replacement token, KEYS[3] user index
// ARGV[1] now (unix seconds), ARGV[2] replacement record, ARGV[3] replacement TTL (ms),
// ARGV[4] replacement value
const ROTATE_LUA: &str = r#"
    local raw = redis.call('GET', KEYS[1])
    if not raw then return {'missing'} end
    local record = cjson.decode(raw)
    if record.state == 'rotated' then return {'rotated', tostring(record.user_id)} end
    if record.state == 'revoked' then return {'revoked'} end
    if record.expires_at <= tonumber(ARGV[1]) then return {'expired'} end
    if redis.call('EXISTS', KEYS[2]) == 1 then return {'duplicate'} end
    record.state = 'rotated'
    redis.call('SET', KEYS[1], cjson.encode(record), 'KEEPTTL')
    redis.call('SET', KEYS[2], ARGV[2], 'PX', ARGV[3])
    redis.call('SADD', KEYS[3], ARGV[4])
    return {'ok'}
"#;

// KEYS[1] token
const REVOKE_LUA: &str = r#"
    local raw = redis.call('GET', KEYS[1])
    if not raw then return {'missing'} end
    local record = cjson.decode(raw)
    if record.state == 'rotated' then return {'rotated', tostring(record.user_id)} end
    if record.state == 'revoked' then return {'revoked'} end
    record.state = 'revoked'
    local updated = cjson.encode(record)
    redis.call('SET', KEYS[1], updated, 'KEEPTTL')
    return {'ok', updated}
"#;

static ADD_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(ADD_LUA));
static ROTATE_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(ROTATE_LUA));
static REVOKE_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(REVOKE_LUA));

#[async_trait::async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    #[tracing::instrument(name = "Adding refresh token to Redis", skip_all)]
    async fn add_token(&self, token: RefreshToken) -> Result<(), RefreshTokenStoreError> {
        let record = encode(&TokenRecord::from_token(&token))?;
        let ttl = retention_millis(token.expires_at(), Utc::now());

        let mut conn = self.conn.write().await;
        let reply: Vec<String> = ADD_SCRIPT
            .key(token_key(token.value()))
            .key(user_key(token.user_id()))
            .arg(record)
            .arg(ttl)
            .arg(token.value().as_str())
            .invoke(&mut *conn)
            .map_err(redis_error)?;

        match reply.first().map(String::as_str) {
            Some("ok") => Ok(()),
            _ => Err(refusal(&reply)),
        }
    }

    #[tracing::instrument(name = "Retrieving refresh token from Redis", skip_all)]
    async fn get_token(
        &self,
        value: &RefreshTokenValue,
    ) -> Result<RefreshToken, RefreshTokenStoreError> {
        let mut conn = self.conn.write().await;
        let raw: Option<String> = conn.get(token_key(value)).map_err(redis_error)?;

        let Some(raw) = raw else {
            return Err(RefreshTokenStoreError::TokenNotFound);
        };

        Ok(decode(&raw)?.into_token(value.clone()))
    }

    #[tracing::instrument(name = "Rotating refresh token in Redis", skip_all)]
    async fn rotate_token(
        &self,
        old: &RefreshTokenValue,
        replacement: ReplacementToken,
    ) -> Result<RefreshToken, RefreshTokenStoreError> {
        let now = replacement.issued_at();

        let mut conn = self.conn.write().await;
        // A token's owner never changes, so the index key can be resolved here
        let current: Option<String> = conn.get(token_key(old)).map_err(redis_error)?;
        let Some(current) = current else {
            return Err(RefreshTokenStoreError::TokenNotFound);
        };
        let user_id = UserId::new(decode(&current)?.user_id);

        let next = TokenRecord {
            user_id: user_id.get(),
            state: TokenState::Active,
            issued_at: replacement.issued_at(),
            expires_at: replacement.expires_at(),
        };

        let reply: Vec<String> = ROTATE_SCRIPT
            .key(token_key(old))
            .key(token_key(replacement.value()))
            .key(user_key(user_id))
            .arg(now.timestamp())
            .arg(encode(&next)?)
            .arg(retention_millis(replacement.expires_at(), now))
            .arg(replacement.value().as_str())
            .invoke(&mut *conn)
            .map_err(redis_error)?;

        match reply.first().map(String::as_str) {
            Some("ok") => Ok(replacement.bind(user_id)),
            _ => Err(refusal(&reply)),
        }
    }

    #[tracing::instrument(name = "Revoking refresh token in Redis", skip_all)]
    async fn revoke_token(
        &self,
        value: &RefreshTokenValue,
    ) -> Result<RefreshToken, RefreshTokenStoreError> {
        let mut conn = self.conn.write().await;
        let reply: Vec<String> = REVOKE_SCRIPT
            .key(token_key(value))
            .invoke(&mut *conn)
            .map_err(redis_error)?;

        match (reply.first().map(String::as_str), reply.get(1)) {
            (Some("ok"), Some(raw)) => Ok(decode(raw)?.into_token(value.clone())),
            _ => Err(refusal(&reply)),
        }
    }

    #[tracing::instrument(name = "Revoking all refresh tokens of a user in Redis", skip(self))]
    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RefreshTokenStoreError> {
        let index = user_key(user_id);
        let mut conn = self.conn.write().await;
        let members: Vec<String> = conn.smembers(&index).map_err(redis_error)?;

        let mut revoked = 0;
        for member in members {
            let reply: Vec<String> = REVOKE_SCRIPT
                .key(format!("{TOKEN_KEY_PREFIX}{member}"))
                .invoke(&mut *conn)
                .map_err(redis_error)?;

            match reply.first().map(String::as_str) {
                Some("ok") => revoked += 1,
                // Evicted after retention; drop it from the index
                Some("missing") => conn
                    .srem::<_, _, ()>(&index, &member)
                    .map_err(redis_error)?,
                _ => {}
            }
        }

        Ok(revoked)
    }
}

// We are using key prefixes to prevent collisions and organize data!
const TOKEN_KEY_PREFIX: &str = "refresh_token:";
const USER_KEY_PREFIX: &str = "refresh_tokens_of:";

fn token_key(value: &RefreshTokenValue) -> String {
    format!("{}{}", TOKEN_KEY_PREFIX, value.as_str())
}

fn user_key(user_id: UserId) -> String {
    format!("{}{}", USER_KEY_PREFIX, user_id)
}
