use latchkey_core::{Email, NewUser, PasswordHash, User, UserId, UserStore, UserStoreError};
use secrecy::Secret;
use sqlx::{FromRow, Pool, Postgres};

pub struct PostgresUserStore {
    pool: sqlx::PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PostgresUserStore { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = UserStoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email =
            Email::parse(&row.email).map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;
        Ok(User::new(
            UserId::new(row.id),
            email,
            PasswordHash::new(Secret::new(row.password_hash)),
        ))
    }
}

fn unexpected(e: sqlx::Error) -> UserStoreError {
    tracing::error!("Database error: {e}");
    UserStoreError::UnexpectedError(e.to_string())
}

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    #[tracing::instrument(name = "Adding user to PostgreSQL", skip_all)]
    async fn add_user(&self, user: NewUser) -> Result<UserId, UserStoreError> {
        let query = sqlx::query_scalar::<_, i64>(
            r#"
                INSERT INTO users (email, password_hash)
                VALUES ($1, $2)
                RETURNING id
            "#,
        )
        .bind(user.email().as_str())
        .bind(user.password_hash().as_str());

        let id = query.fetch_one(&self.pool).await.map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return UserStoreError::UserAlreadyExists;
                }
            }
            unexpected(e)
        })?;

        Ok(UserId::new(id))
    }

    #[tracing::instrument(name = "Retrieving user from PostgreSQL", skip(self))]
    async fn get_user(&self, id: UserId) -> Result<User, UserStoreError> {
        let query = sqlx::query_as::<_, UserRow>(
            r#"
                SELECT id, email, password_hash
                FROM users
                WHERE id = $1
            "#,
        )
        .bind(id.get());

        let Some(row) = query.fetch_optional(&self.pool).await.map_err(unexpected)? else {
            return Err(UserStoreError::UserNotFound);
        };

        User::try_from(row)
    }

    #[tracing::instrument(name = "Retrieving user by email from PostgreSQL", skip_all)]
    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        let query = sqlx::query_as::<_, UserRow>(
            r#"
                SELECT id, email, password_hash
                FROM users
                WHERE email = $1
            "#,
        )
        .bind(email.as_str());

        let Some(row) = query.fetch_optional(&self.pool).await.map_err(unexpected)? else {
            return Err(UserStoreError::UserNotFound);
        };

        User::try_from(row)
    }
}
