//! Audit log ports and application service.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use storefront_core::{AppError, AppResult, Role, UserIdentity};
use storefront_domain::{AuditAction, UserId};

use crate::{Clock, require_role};

/// Default page size for audit log listings.
const DEFAULT_LIMIT: u32 = 100;
/// Largest accepted page size.
const MAX_LIMIT: u32 = 1000;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// One persisted audit event.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// Acting user, when known.
    pub user_id: Option<UserId>,
    /// Acting username, when known.
    pub username: Option<String>,
    /// What happened.
    pub action: AuditAction,
    /// Free-form JSON object with action-specific detail.
    pub details: Value,
    /// Client address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// HTTP status returned to the client.
    pub status_code: u16,
    /// Whether the action succeeded.
    pub success: bool,
    /// Error message for failed actions.
    pub error_message: Option<String>,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// Filters and paging for audit log listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Only entries with this action.
    pub action: Option<AuditAction>,
    /// Only entries by this user.
    pub user_id: Option<UserId>,
    /// Page size.
    pub limit: u32,
    /// Entries to skip.
    pub offset: u64,
}

impl AuditLogQuery {
    /// Returns whether `entry` passes the filters.
    #[must_use]
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.action.is_none_or(|action| entry.action == action)
            && self
                .user_id
                .is_none_or(|user_id| entry.user_id == Some(user_id))
    }
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            action: None,
            user_id: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One page of audit entries, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogPage {
    /// Entries on this page.
    pub entries: Vec<AuditLogEntry>,
    /// Entries matching the filters across all pages.
    pub total: u64,
    /// Requested page size.
    pub limit: u32,
    /// Requested offset.
    pub offset: u64,
}

impl AuditLogPage {
    /// Returns whether further pages exist.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.entries.len() as u64) < self.total
    }
}

/// Port for persisting append-only audit entries.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Persists one entry.
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()>;

    /// Lists entries matching `query`, newest first.
    async fn list(&self, query: &AuditLogQuery) -> AppResult<AuditLogPage>;
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Audit event about to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogInput {
    /// What happened.
    pub action: AuditAction,
    /// Acting user, when known.
    pub user_id: Option<UserId>,
    /// Acting username, when known.
    pub username: Option<String>,
    /// Action-specific detail.
    pub details: Value,
    /// Client address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// HTTP status returned to the client.
    pub status_code: u16,
    /// Whether the action succeeded.
    pub success: bool,
    /// Error message for failed actions.
    pub error_message: Option<String>,
}

impl AuditLogInput {
    /// Starts a record of a successful action.
    #[must_use]
    pub fn success(action: AuditAction, status_code: u16) -> Self {
        Self {
            action,
            user_id: None,
            username: None,
            details: Value::Object(serde_json::Map::new()),
            ip_address: None,
            user_agent: None,
            status_code,
            success: true,
            error_message: None,
        }
    }

    /// Starts a record of a failed action.
    #[must_use]
    pub fn failure(action: AuditAction, status_code: u16, error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(error_message.into()),
            ..Self::success(action, status_code)
        }
    }

    /// Attributes the event to an authenticated identity.
    #[must_use]
    pub fn with_actor(self, actor: &UserIdentity) -> Self {
        self.with_user(UserId::from_str(actor.subject()).ok(), actor.username())
    }

    /// Attributes the event to a user.
    #[must_use]
    pub fn with_user(mut self, user_id: Option<UserId>, username: impl Into<String>) -> Self {
        self.user_id = user_id;
        self.username = Some(username.into());
        self
    }

    /// Attaches action-specific detail.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Attaches client address and user agent.
    #[must_use]
    pub fn with_request(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

/// Raw listing parameters as received from a client.
#[derive(Debug, Clone, Default)]
pub struct ListAuditLogParams {
    /// Page size, 1..=1000.
    pub limit: Option<i64>,
    /// Entries to skip, non-negative.
    pub offset: Option<i64>,
    /// Action name filter.
    pub action: Option<String>,
    /// User id filter.
    pub user_id: Option<String>,
}

impl ListAuditLogParams {
    /// Validates the parameters into a query.
    pub fn into_query(self) -> AppResult<AuditLogQuery> {
        let limit = match self.limit {
            None => DEFAULT_LIMIT,
            Some(limit) => u32::try_from(limit)
                .ok()
                .filter(|limit| (1..=MAX_LIMIT).contains(limit))
                .ok_or_else(|| {
                    AppError::Validation(format!("limit must be between 1 and {MAX_LIMIT}"))
                })?,
        };
        let offset = match self.offset {
            None => 0,
            Some(offset) => u64::try_from(offset).map_err(|_| {
                AppError::Validation("offset must be zero or greater".to_owned())
            })?,
        };
        let action = non_blank(self.action)
            .map(|action| AuditAction::from_str(&action))
            .transpose()?;
        let user_id = non_blank(self.user_id)
            .map(|user_id| UserId::from_str(&user_id))
            .transpose()?;

        Ok(AuditLogQuery {
            action,
            user_id,
            limit,
            offset,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for the audit trail.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
    clock: Arc<dyn Clock>,
}

impl AuditLogService {
    /// Creates a new audit log service.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Stamps and persists one audit event.
    pub async fn record(&self, input: AuditLogInput) -> AppResult<AuditLogEntry> {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            username: input.username,
            action: input.action,
            details: input.details,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            status_code: input.status_code,
            success: input.success,
            error_message: input.error_message,
            created_at: self.clock.now(),
        };

        self.repository.append(entry.clone()).await?;
        Ok(entry)
    }

    /// Lists audit entries. Admin only.
    pub async fn list(
        &self,
        actor: &UserIdentity,
        params: ListAuditLogParams,
    ) -> AppResult<AuditLogPage> {
        require_role(actor, Role::Admin)?;
        let query = params.into_query()?;
        self.repository.list(&query).await
    }
}
