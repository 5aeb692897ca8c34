//! Process-local audit log repository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use storefront_application::{AuditLogEntry, AuditLogPage, AuditLogQuery, AuditLogRepository};
use storefront_core::AppResult;

/// In-memory implementation of the audit log repository port.
#[derive(Debug, Default)]
pub struct InMemoryAuditLogRepository {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLogRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn list(&self, query: &AuditLogQuery) -> AppResult<AuditLogPage> {
        let entries = self.entries.read().await;
        let mut matching = entries
            .iter()
            .rev()
            .filter(|entry| query.matches(entry))
            .collect::<Vec<_>>();
        matching.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(AuditLogPage {
            entries: page,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }
}
