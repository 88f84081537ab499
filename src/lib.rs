//! # Latchkey - Authentication Core
//!
//! This is a facade crate that re-exports the public APIs of the latchkey components.
//! Use this crate to get credential handling and refresh token rotation in one place.
//!
//! ## Usage
//!
//! ```no_run
//! use latchkey::{
//!     Argon2PasswordHasher, AuthService, HashMapRefreshTokenStore, HashMapUserStore,
//!     JwtAccessTokenIssuer, JwtConfig, Secret, Settings,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load()?;
//! let service = AuthService::new(
//!     HashMapUserStore::new(),
//!     HashMapRefreshTokenStore::new(),
//!     Argon2PasswordHasher::new(&settings.auth.password_hashing)?,
//!     JwtAccessTokenIssuer::new(JwtConfig::from(&settings.auth.access_token)),
//!     settings.auth.token_policy()?,
//! );
//!
//! let user_id = service
//!     .register(Secret::new("a@x.com".into()), Secret::new("pw123".into()))
//!     .await?;
//! let token = service.issue_token(user_id).await?;
//! let pair = service.rotate(token.value().as_str()).await?;
//! # let _ = pair;
//! # Ok(())
//! # }
//! ```
//!
//! ## Structure
//!
//! - **Core domain types**: `Email`, `Password`, `User`, `RefreshToken`, etc.
//! - **Ports**: `UserStore`, `RefreshTokenStore`, `PasswordHasher`, `AccessTokenIssuer`
//! - **Use cases**: `RegisterUseCase`, `RotateRefreshTokenUseCase`, etc.
//! - **Adapters**: `PostgresUserStore`, `RedisRefreshTokenStore`, `Argon2PasswordHasher`, etc.
//! - **Service**: `AuthService` - The main entry point

// ============================================================================
// Core Domain Types
// ============================================================================

/// Core domain types and value objects
pub mod core {
    pub use latchkey_core::*;
}

pub use latchkey_core::{
    AccessToken, Email, Password, PasswordHash, RefreshToken, RefreshTokenValue, TokenPair,
    TokenState, TokenStatus, User, UserError, UserId,
};

// ============================================================================
// Ports
// ============================================================================

/// Repository and service trait definitions
pub mod ports {
    pub use latchkey_core::{
        AccessTokenError, AccessTokenIssuer, PasswordHasher, PasswordHasherError,
        RefreshTokenStore, RefreshTokenStoreError, UserStore, UserStoreError,
    };
}

pub use ports::{AccessTokenIssuer, PasswordHasher, RefreshTokenStore, UserStore};

// ============================================================================
// Use Cases (Application Layer)
// ============================================================================

/// Application use cases
pub mod use_cases {
    pub use latchkey_application::*;
}

pub use latchkey_application::{AuthError, TokenPolicy};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters
pub mod adapters {
    /// Persistence implementations
    pub mod persistence {
        pub use latchkey_adapters::persistence::*;
    }

    /// Password hashing
    pub mod hashing {
        pub use latchkey_adapters::hashing::*;
    }

    /// Access token minting and validation
    pub mod access_tokens {
        pub use latchkey_adapters::access_tokens::*;
    }

    /// Configuration
    pub mod config {
        pub use latchkey_adapters::config::*;
    }

    pub use latchkey_adapters::telemetry;
}

pub use latchkey_adapters::{
    Argon2PasswordHasher, Claims, HashMapRefreshTokenStore, HashMapUserStore,
    JwtAccessTokenIssuer, JwtConfig, PostgresRefreshTokenStore, PostgresUserStore,
    RedisRefreshTokenStore, Settings, init_tracing,
};

// ============================================================================
// Auth Service (Main Entry Point)
// ============================================================================

/// Main auth service
pub use latchkey_service::{
    AuthService, configure_postgresql, configure_redis, get_postgres_pool, get_redis_client,
};

// ============================================================================
// Re-export common external dependencies
// ============================================================================

/// Re-export async-trait for implementing the ports
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};
