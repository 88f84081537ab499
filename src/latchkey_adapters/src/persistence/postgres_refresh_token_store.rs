use chrono::{DateTime, Utc};
use latchkey_core::{
    RefreshToken, RefreshTokenStore, RefreshTokenStoreError, RefreshTokenValue, ReplacementToken,
    TokenState, UserId,
};
use sqlx::{FromRow, Pool, Postgres};

pub struct PostgresRefreshTokenStore {
    pool: sqlx::PgPool,
}

impl PostgresRefreshTokenStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PostgresRefreshTokenStore { pool }
    }
}

#[derive(FromRow)]
struct TokenRow {
    token: String,
    user_id: i64,
    state: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for RefreshToken {
    type Error = RefreshTokenStoreError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let value = RefreshTokenValue::parse(&row.token)
            .map_err(|e| RefreshTokenStoreError::UnexpectedError(e.to_string()))?;
        let state = row
            .state
            .parse::<TokenState>()
            .map_err(|e| RefreshTokenStoreError::UnexpectedError(e.to_string()))?;
        Ok(RefreshToken::restore(
            value,
            UserId::new(row.user_id),
            row.issued_at,
            row.expires_at,
            state,
        ))
    }
}

/// Explain why a conditional update touched no row.
fn refusal(existing: Option<RefreshToken>) -> RefreshTokenStoreError {
    match existing {
        None => RefreshTokenStoreError::TokenNotFound,
        Some(token) => match token.state() {
            TokenState::Rotated => RefreshTokenStoreError::TokenAlreadyUsed {
                user_id: token.user_id(),
            },
            TokenState::Revoked => RefreshTokenStoreError::TokenRevoked,
            TokenState::Active => RefreshTokenStoreError::TokenExpired,
        },
    }
}

fn unexpected(e: sqlx::Error) -> RefreshTokenStoreError {
    tracing::error!("Database error: {e}");
    RefreshTokenStoreError::UnexpectedError(e.to_string())
}

fn insert_error(e: sqlx::Error) -> RefreshTokenStoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return RefreshTokenStoreError::TokenAlreadyExists;
        }
    }
    unexpected(e)
}

const SELECT_TOKEN: &str = r#"
    SELECT token, user_id, state, issued_at, expires_at
    FROM refresh_tokens
    WHERE token = $1
"#;

const INSERT_TOKEN: &str = r#"
    INSERT INTO refresh_tokens (token, user_id, state, issued_at, expires_at)
    VALUES ($1, $2, $3, $4, $5)
"#;

#[async_trait::async_trait]
impl RefreshTokenStore for PostgresRefreshTokenStore {
    #[tracing::instrument(name = "Adding refresh token to PostgreSQL", skip_all)]
    async fn add_token(&self, token: RefreshToken) -> Result<(), RefreshTokenStoreError> {
        sqlx::query(INSERT_TOKEN)
            .bind(token.value().as_str())
            .bind(token.user_id().get())
            .bind(token.state().as_str())
            .bind(token.issued_at())
            .bind(token.expires_at())
            .execute(&self.pool)
            .await
            .map_err(insert_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Retrieving refresh token from PostgreSQL", skip_all)]
    async fn get_token(
        &self,
        value: &RefreshTokenValue,
    ) -> Result<RefreshToken, RefreshTokenStoreError> {
        let row = sqlx::query_as::<_, TokenRow>(SELECT_TOKEN)
            .bind(value.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        let Some(row) = row else {
            return Err(RefreshTokenStoreError::TokenNotFound);
        };

        RefreshToken::try_from(row)
    }

    #[tracing::instrument(name = "Rotating refresh token in PostgreSQL", skip_all)]
    async fn rotate_token(
        &self,
        old: &RefreshTokenValue,
        replacement: ReplacementToken,
    ) -> Result<RefreshToken, RefreshTokenStoreError> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // The row lock taken here serialises concurrent rotations of `old`;
        // later ones re-check the predicate after the first commits.
        let consumed = sqlx::query_scalar::<_, i64>(
            r#"
                UPDATE refresh_tokens
                SET state = 'rotated'
                WHERE token = $1 AND state = 'active' AND expires_at > $2
                RETURNING user_id
            "#,
        )
        .bind(old.as_str())
        .bind(replacement.issued_at())
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?;

        let Some(user_id) = consumed else {
            let existing = sqlx::query_as::<_, TokenRow>(SELECT_TOKEN)
                .bind(old.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(unexpected)?
                .map(RefreshToken::try_from)
                .transpose()?;
            tx.rollback().await.map_err(unexpected)?;
            return Err(refusal(existing));
        };

        let next = replacement.bind(UserId::new(user_id));
        sqlx::query(INSERT_TOKEN)
            .bind(next.value().as_str())
            .bind(next.user_id().get())
            .bind(next.state().as_str())
            .bind(next.issued_at())
            .bind(next.expires_at())
            .execute(&mut *tx)
            .await
            .map_err(insert_error)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(next)
    }

    #[tracing::instrument(name = "Revoking refresh token in PostgreSQL", skip_all)]
    async fn revoke_token(
        &self,
        value: &RefreshTokenValue,
    ) -> Result<RefreshToken, RefreshTokenStoreError> {
        let revoked = sqlx::query_as::<_, TokenRow>(
            r#"
                UPDATE refresh_tokens
                SET state = 'revoked'
                WHERE token = $1 AND state = 'active'
                RETURNING token, user_id, state, issued_at, expires_at
            "#,
        )
        .bind(value.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match revoked {
            Some(row) => RefreshToken::try_from(row),
            None => match self.get_token(value).await {
                Ok(existing) => Err(refusal(Some(existing))),
                Err(e) => Err(e),
            },
        }
    }

    #[tracing::instrument(name = "Revoking all refresh tokens of a user in PostgreSQL", skip(self))]
    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RefreshTokenStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE refresh_tokens
                SET state = 'revoked'
                WHERE user_id = $1 AND state = 'active'
            "#,
        )
        .bind(user_id.get())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(result.rows_affected())
    }
}
