use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use latchkey_core::{AccessToken, AccessTokenError, AccessTokenIssuer, UserError, UserId};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AccessTokenSettings;

#[derive(Clone)]
pub struct JwtConfig {
    pub jwt_secret: Secret<String>,
    pub token_ttl_in_seconds: i64,
}

impl JwtConfig {
    pub fn as_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

impl From<&AccessTokenSettings> for JwtConfig {
    fn from(settings: &AccessTokenSettings) -> Self {
        Self {
            jwt_secret: settings.jwt_secret.clone(),
            token_ttl_in_seconds: settings.ttl_seconds,
        }
    }
}

/// Mints HS256 access tokens and checks ones presented back.
#[derive(Clone)]
pub struct JwtAccessTokenIssuer {
    config: JwtConfig,
}

impl JwtAccessTokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Decode `token`, checking its signature and expiry.
    pub fn validate(&self, token: &str) -> Result<Claims, AccessTokenError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AccessTokenError::Expired,
            _ => AccessTokenError::InvalidToken,
        })
    }
}

impl AccessTokenIssuer for JwtAccessTokenIssuer {
    #[tracing::instrument(name = "Issuing access token", skip(self))]
    fn issue(&self, user_id: UserId) -> Result<AccessToken, AccessTokenError> {
        let delta = chrono::Duration::try_seconds(self.config.token_ttl_in_seconds).ok_or(
            AccessTokenError::SigningFailed("Failed to create access token duration".to_string()),
        )?;

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(delta)
            .ok_or(AccessTokenError::SigningFailed(
                "Duration out of range".to_string(),
            ))?;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.as_bytes()),
        )
        .map_err(|e| AccessTokenError::SigningFailed(e.to_string()))?;

        Ok(AccessToken::new(Secret::new(token), expires_at))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId, UserError> {
        self.sub.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_config(ttl: i64) -> JwtConfig {
        JwtConfig {
            jwt_secret: Secret::new("secret".to_owned()),
            token_ttl_in_seconds: ttl,
        }
    }

    #[test]
    fn test_issue_access_token() {
        let issuer = JwtAccessTokenIssuer::new(jwt_config(600));

        let token = issuer.issue(UserId::new(1)).unwrap();

        assert_eq!(token.as_str().split('.').count(), 3);
        let remaining = token.expires_at() - Utc::now();
        assert!(remaining > chrono::Duration::minutes(9));
    }

    #[test]
    fn test_validate_token_with_valid_token() {
        let issuer = JwtAccessTokenIssuer::new(jwt_config(600));
        let token = issuer.issue(UserId::new(42)).unwrap();

        let claims = issuer.validate(token.as_str()).unwrap();

        assert_eq!(claims.user_id(), Ok(UserId::new(42)));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tokens_are_unique_per_issue() {
        let issuer = JwtAccessTokenIssuer::new(jwt_config(600));
        let a = issuer.issue(UserId::new(1)).unwrap();
        let b = issuer.issue(UserId::new(1)).unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_validate_token_with_invalid_token() {
        let issuer = JwtAccessTokenIssuer::new(jwt_config(600));
        let result = issuer.validate("invalid_token");
        assert!(matches!(result, Err(AccessTokenError::InvalidToken)));
    }

    #[test]
    fn test_validate_token_signed_with_other_secret() {
        let issuer = JwtAccessTokenIssuer::new(jwt_config(600));
        let other = JwtAccessTokenIssuer::new(JwtConfig {
            jwt_secret: Secret::new("other".to_owned()),
            token_ttl_in_seconds: 600,
        });
        let token = other.issue(UserId::new(1)).unwrap();

        assert!(matches!(
            issuer.validate(token.as_str()),
            Err(AccessTokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_validate_expired_token() {
        // Past the default 60 second leeway
        let issuer = JwtAccessTokenIssuer::new(jwt_config(-600));
        let token = issuer.issue(UserId::new(1)).unwrap();

        assert!(matches!(
            issuer.validate(token.as_str()),
            Err(AccessTokenError::Expired)
        ));
    }
}
