use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use storefront_application::{AuditLogEntry, AuditLogPage, AuditLogQuery, AuditLogRepository};
use storefront_core::{AppError, AppResult};
use storefront_domain::{AuditAction, UserId};

/// PostgreSQL-backed repository for the audit trail.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: uuid::Uuid,
    user_id: Option<uuid::Uuid>,
    username: Option<String>,
    action: String,
    details: serde_json::Value,
    ip_address: Option<String>,
    user_agent: Option<String>,
    status_code: i32,
    success: bool,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditLogRow> for AuditLogEntry {
    type Error = AppError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let status_code = u16::try_from(row.status_code).map_err(|error| {
            AppError::Internal(format!(
                "audit entry '{}' has invalid status code {}: {error}",
                row.id, row.status_code
            ))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id.map(UserId::from_uuid),
            username: row.username,
            action: row.action.parse::<AuditAction>()?,
            details: row.details,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            status_code,
            success: row.success,
            error_message: row.error_message,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id,
                user_id,
                username,
                action,
                details,
                ip_address,
                user_agent,
                status_code,
                success,
                error_message,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id.map(|user_id| user_id.as_uuid()))
        .bind(entry.username)
        .bind(entry.action.as_str())
        .bind(entry.details)
        .bind(entry.ip_address)
        .bind(entry.user_agent)
        .bind(i32::from(entry.status_code))
        .bind(entry.success)
        .bind(entry.error_message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit log entry: {error}")))?;

        Ok(())
    }

    async fn list(&self, query: &AuditLogQuery) -> AppResult<AuditLogPage> {
        let action = query.action.map(|action| action.as_str());
        let user_id = query.user_id.map(|user_id| user_id.as_uuid());
        let offset = i64::try_from(query.offset)
            .map_err(|_| AppError::Validation("offset is too large".to_owned()))?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM audit_logs
            WHERE ($1::TEXT IS NULL OR action = $1)
                AND ($2::UUID IS NULL OR user_id = $2)
            "#,
        )
        .bind(action)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count audit log entries: {error}")))?;

        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                id,
                user_id,
                username,
                action,
                details,
                ip_address,
                user_agent,
                status_code,
                success,
                error_message,
                created_at
            FROM audit_logs
            WHERE ($1::TEXT IS NULL OR action = $1)
                AND ($2::UUID IS NULL OR user_id = $2)
            ORDER BY created_at DESC, id
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(action)
        .bind(user_id)
        .bind(i64::from(query.limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit log entries: {error}")))?;

        let entries = rows
            .into_iter()
            .map(AuditLogEntry::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(AuditLogPage {
            entries,
            total: u64::try_from(total).unwrap_or(0),
            limit: query.limit,
            offset: query.offset,
        })
    }
}
