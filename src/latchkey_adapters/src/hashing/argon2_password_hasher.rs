use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash as PhcHash, PasswordVerifier, Version,
    password_hash::{self, PasswordHasher as _, SaltString, rand_core},
};
use latchkey_core::{Password, PasswordHash, PasswordHasher, PasswordHasherError};
use secrecy::{ExposeSecret, Secret};

use crate::config::PasswordHashingSettings;

// Only ever hashed to get a realistic PHC string for timing equalisation.
// The digest is computed at construction so the first unknown-email check
// costs the same as every later one.
const DUMMY_PASSWORD: &[u8] = b"latchkey-dummy-password";

/// Argon2id hasher. Work runs on the blocking pool so the executor keeps
/// serving other requests while a hash is computed.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
    dummy_hash: Arc<String>,
}

impl Argon2PasswordHasher {
    pub fn new(settings: &PasswordHashingSettings) -> Result<Self, PasswordHasherError> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|e| PasswordHasherError::HashingFailed(e.to_string()))?;

        Self::with_params(params)
    }

    pub fn with_params(params: Params) -> Result<Self, PasswordHasherError> {
        let dummy_hash = compute_password_hash(&params, DUMMY_PASSWORD)?;

        Ok(Self {
            params,
            dummy_hash: Arc::new(dummy_hash),
        })
    }
}

#[async_trait::async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    #[tracing::instrument(name = "Computing password hash", skip_all)]
    async fn hash(&self, password: Password) -> Result<PasswordHash, PasswordHasherError> {
        let params = self.params.clone();
        let phc = run_blocking(move || {
            compute_password_hash(&params, password.as_ref().expose_secret().as_bytes())
        })
        .await?;

        Ok(PasswordHash::new(Secret::new(phc)))
    }

    #[tracing::instrument(name = "Verify password hash", skip_all)]
    async fn verify(
        &self,
        candidate: Password,
        expected: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let params = self.params.clone();
        let expected = expected.as_str().to_owned();
        run_blocking(move || {
            verify_password_hash(
                &params,
                candidate.as_ref().expose_secret().as_bytes(),
                &expected,
            )
        })
        .await
    }

    #[tracing::instrument(name = "Verify dummy password hash", skip_all)]
    async fn verify_dummy(&self, candidate: Password) -> Result<(), PasswordHasherError> {
        let params = self.params.clone();
        let dummy_hash = Arc::clone(&self.dummy_hash);
        run_blocking(move || {
            verify_password_hash(
                &params,
                candidate.as_ref().expose_secret().as_bytes(),
                &dummy_hash,
            )
            .map(|_| ())
        })
        .await
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, PasswordHasherError>
where
    F: FnOnce() -> Result<T, PasswordHasherError> + Send + 'static,
    T: Send + 'static,
{
    let current_span: tracing::Span = tracing::Span::current();
    tokio::task::spawn_blocking(move || current_span.in_scope(work))
        .await
        .map_err(|e| PasswordHasherError::HashingFailed(e.to_string()))?
}

fn hasher(params: &Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
}

fn compute_password_hash(params: &Params, password: &[u8]) -> Result<String, PasswordHasherError> {
    let salt: SaltString = SaltString::generate(rand_core::OsRng);
    hasher(params)
        .hash_password(password, &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordHasherError::HashingFailed(e.to_string()))
}

fn verify_password_hash(
    params: &Params,
    candidate: &[u8],
    expected: &str,
) -> Result<bool, PasswordHasherError> {
    let expected = PhcHash::new(expected)
        .map_err(|e| PasswordHasherError::MalformedHash(e.to_string()))?;

    match hasher(params).verify_password(candidate, &expected) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordHasherError::MalformedHash(e.to_string())),
    }
}
