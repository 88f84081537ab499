pub mod access_tokens;
pub mod config;
pub mod hashing;
pub mod persistence;
pub mod telemetry;

pub use access_tokens::{Claims, JwtAccessTokenIssuer, JwtConfig};
pub use config::Settings;
pub use hashing::Argon2PasswordHasher;
pub use persistence::{
    HashMapRefreshTokenStore, HashMapUserStore, PostgresRefreshTokenStore, PostgresUserStore,
    RedisRefreshTokenStore,
};
pub use telemetry::init_tracing;
