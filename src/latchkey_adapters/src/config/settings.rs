use chrono::Duration;
use config::{ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use latchkey_application::{DEFAULT_REFRESH_TOKEN_TTL_SECONDS, TokenPolicy};
use secrecy::Secret;
use serde::Deserialize;

use super::constants::{SETTINGS_FILE, defaults, env};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub auth: AuthSettings,
    pub postgres: PostgresSettings,
    pub redis: RedisSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub password_hashing: PasswordHashingSettings,
    pub refresh_token: RefreshTokenSettings,
    pub access_token: AccessTokenSettings,
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordHashingSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenSettings {
    pub ttl_seconds: i64,
    pub revoke_family_on_reuse: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenSettings {
    pub jwt_secret: Secret<String>,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresSettings {
    pub url: Secret<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub host_name: String,
}

impl Settings {
    /// Load settings from built-in defaults, an optional `config/settings.*`
    /// file and `LATCHKEY__*` environment variables, in that order of
    /// precedence. A `.env` file is read first if present. An out of range
    /// refresh token TTL is rejected here.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let settings = Self::builder()?
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(
                Environment::with_prefix(env::ENV_PREFIX)
                    .prefix_separator(env::ENV_SEPARATOR)
                    .separator(env::ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?;

        settings.auth.token_policy()?;
        Ok(settings)
    }

    /// Builder pre-populated with every default. The JWT secret has none.
    pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default(
                "auth.password_hashing.memory_kib",
                defaults::PASSWORD_HASH_MEMORY_KIB,
            )?
            .set_default(
                "auth.password_hashing.iterations",
                defaults::PASSWORD_HASH_ITERATIONS,
            )?
            .set_default(
                "auth.password_hashing.parallelism",
                defaults::PASSWORD_HASH_PARALLELISM,
            )?
            .set_default(
                "auth.refresh_token.ttl_seconds",
                DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            )?
            .set_default(
                "auth.refresh_token.revoke_family_on_reuse",
                defaults::REVOKE_FAMILY_ON_REUSE,
            )?
            .set_default(
                "auth.access_token.ttl_seconds",
                defaults::ACCESS_TOKEN_TTL_SECONDS,
            )?
            .set_default("postgres.url", defaults::POSTGRES_URL)?
            .set_default(
                "postgres.max_connections",
                defaults::POSTGRES_MAX_CONNECTIONS,
            )?
            .set_default("redis.host_name", defaults::REDIS_HOST_NAME)
    }
}

impl AuthSettings {
    pub fn token_policy(&self) -> Result<TokenPolicy, ConfigError> {
        let ttl = Duration::try_seconds(self.refresh_token.ttl_seconds).ok_or_else(|| {
            ConfigError::Message(format!(
                "auth.refresh_token.ttl_seconds out of range: {}",
                self.refresh_token.ttl_seconds
            ))
        })?;

        Ok(TokenPolicy::new(
            ttl,
            self.refresh_token.revoke_family_on_reuse,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .set_override("auth.access_token.jwt_secret", "s3cret")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.auth.password_hashing.memory_kib, 15000);
        assert_eq!(settings.auth.access_token.ttl_seconds, 900);
        assert_eq!(settings.auth.access_token.jwt_secret.expose_secret(), "s3cret");
        assert_eq!(settings.redis.host_name, "127.0.0.1");

        let policy = settings.auth.token_policy().unwrap();
        assert_eq!(
            policy.refresh_token_ttl,
            Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECONDS)
        );
        assert!(policy.revoke_family_on_reuse);
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let result = Settings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<Settings>();
        assert!(result.is_err());
    }

    #[test]
    fn overrides_win_over_defaults() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .set_override("auth.access_token.jwt_secret", "s3cret")
            .unwrap()
            .set_override("auth.refresh_token.ttl_seconds", 60_i64)
            .unwrap()
            .set_override("auth.refresh_token.revoke_family_on_reuse", false)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let policy = settings.auth.token_policy().unwrap();
        assert_eq!(policy.refresh_token_ttl, Duration::seconds(60));
        assert!(!policy.revoke_family_on_reuse);
    }

    #[test]
    fn out_of_range_refresh_ttl_is_a_config_error() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .set_override("auth.access_token.jwt_secret", "s3cret")
            .unwrap()
            .set_override("auth.refresh_token.ttl_seconds", i64::MAX)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(matches!(
            settings.auth.token_policy(),
            Err(ConfigError::Message(_))
        ));
    }
}
