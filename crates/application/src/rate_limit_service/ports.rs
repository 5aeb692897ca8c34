use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use storefront_core::AppResult;

/// Repository port for rate limit buckets.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Records a request for `key` at `now` and returns the updated bucket.
    ///
    /// The read-check-write on a bucket must be one atomic step per key:
    /// concurrent requests for the same key never lose an increment.
    async fn record_attempt(
        &self,
        key: &str,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo>;

    /// Removes buckets whose window opened before `before`.
    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Information about the current rate limit window for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptInfo {
    /// Number of requests in the current window (including this one).
    pub attempt_count: i64,
    /// When the current window started.
    pub window_started_at: DateTime<Utc>,
}
