//! PostgreSQL-backed user repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storefront_application::{NewUser, UserRecord, UserRepository};
use storefront_core::{AppError, AppResult, Role};
use storefront_domain::UserId;

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: uuid::Uuid,
    username: String,
    password_hash: String,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|role| Role::from_str(role))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            password_hash: row.password_hash,
            roles,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, roles, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by username: {error}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, roles, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user '{user_id}': {error}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let roles = user
            .roles
            .iter()
            .map(|role| role.as_str().to_owned())
            .collect::<Vec<_>>();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, password_hash, roles)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, password_hash, roles, created_at
            "#,
        )
        .bind(UserId::new().as_uuid())
        .bind(user.username.as_str())
        .bind(user.password_hash.as_str())
        .bind(roles)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create user: {error}")))?
        .ok_or_else(|| AppError::Conflict("User already exists".to_owned()))?;

        row.try_into()
    }

    async fn list(&self) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, roles, created_at
            FROM users
            ORDER BY created_at, username
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        rows.into_iter().map(UserRecord::try_from).collect()
    }
}
