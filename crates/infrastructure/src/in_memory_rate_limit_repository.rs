//! Process-local rate limit repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use storefront_application::{AttemptInfo, RateBucket, RateLimitRepository};
use storefront_core::AppResult;

/// In-memory implementation of the rate limit repository port.
///
/// All buckets live behind one async mutex, so the expiry check and the
/// increment for a key always happen inside a single critical section.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitRepository {
    buckets: Mutex<HashMap<String, RateBucket>>,
}

impl InMemoryRateLimitRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &str,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry(key.to_owned())
            .and_modify(|bucket| bucket.record(now, window))
            .or_insert_with(|| RateBucket::open(now));

        Ok(bucket.attempt_info())
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut buckets = self.buckets.lock().await;
        let initial = buckets.len();
        buckets.retain(|_, bucket| !bucket.started_before(before));

        Ok((initial - buckets.len()) as u64)
    }
}
