pub mod constants;
pub mod settings;

pub use constants::*;
pub use settings::{
    AccessTokenSettings, AuthSettings, PasswordHashingSettings, PostgresSettings,
    RedisSettings, RefreshTokenSettings, Settings,
};
