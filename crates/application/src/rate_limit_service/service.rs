use std::sync::Arc;

use storefront_core::{AppError, AppResult};

use crate::Clock;

use super::config::RateLimitRule;
use super::key::RateLimitKey;
use super::ports::{AttemptInfo, RateLimitRepository};

/// Application service for rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitRepository>,
    clock: Arc<dyn Clock>,
    rule: RateLimitRule,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RateLimitRepository>,
        clock: Arc<dyn Clock>,
        rule: RateLimitRule,
    ) -> Self {
        Self {
            repository,
            clock,
            rule,
        }
    }

    /// Returns the configured quota.
    #[must_use]
    pub fn rule(&self) -> RateLimitRule {
        self.rule
    }

    /// Counts one request for `key` and decides whether it may proceed.
    ///
    /// Returns the bucket state when admitted, or `AppError::RateLimited`
    /// carrying the configured window and quota.
    pub async fn admit(&self, key: &RateLimitKey) -> AppResult<AttemptInfo> {
        let info = self
            .repository
            .record_attempt(&key.storage_key(), self.rule.window(), self.clock.now())
            .await?;

        if info.attempt_count > i64::from(self.rule.max_requests()) {
            return Err(AppError::RateLimited {
                window_ms: self.rule.window_ms(),
                max_requests: self.rule.max_requests(),
            });
        }

        Ok(info)
    }

    /// Evicts buckets whose window has fully elapsed.
    ///
    /// An evicted key behaves exactly like an expired one: its next request
    /// opens a fresh window.
    pub async fn sweep(&self) -> AppResult<u64> {
        let cutoff = self.clock.now() - self.rule.window();
        self.repository.cleanup_expired(cutoff).await
    }
}
