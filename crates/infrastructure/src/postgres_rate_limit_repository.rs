//! PostgreSQL-backed rate limit repository using the `rate_limit_buckets` table.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;

use storefront_application::{AttemptInfo, RateLimitRepository};
use storefront_core::{AppError, AppResult};

/// PostgreSQL implementation of the rate limit repository port. Shares
/// buckets between every API instance pointed at the same database.
#[derive(Clone)]
pub struct PostgresRateLimitRepository {
    pool: PgPool,
}

impl PostgresRateLimitRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitRepository for PostgresRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &str,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        // One upsert per request: the row lock taken by ON CONFLICT makes the
        // expiry check and the increment a single step per key.
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            INSERT INTO rate_limit_buckets (key, window_started_at, attempt_count)
            VALUES ($1, $3, 1)
            ON CONFLICT (key) DO UPDATE
            SET
                attempt_count = CASE
                    WHEN $3 - rate_limit_buckets.window_started_at > make_interval(secs => $2::float8)
                    THEN 1
                    ELSE rate_limit_buckets.attempt_count + 1
                END,
                window_started_at = CASE
                    WHEN $3 - rate_limit_buckets.window_started_at > make_interval(secs => $2::float8)
                    THEN $3
                    ELSE rate_limit_buckets.window_started_at
                END
            RETURNING attempt_count, window_started_at
            "#,
        )
        .bind(key)
        .bind(window.num_milliseconds() as f64 / 1000.0)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to record rate limit attempt: {error}"))
        })?;

        Ok(AttemptInfo {
            attempt_count: row.attempt_count,
            window_started_at: row.window_started_at,
        })
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM rate_limit_buckets
            WHERE window_started_at < $1
            "#,
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to cleanup expired rate limits: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AttemptRow {
    attempt_count: i64,
    window_started_at: DateTime<Utc>,
}
