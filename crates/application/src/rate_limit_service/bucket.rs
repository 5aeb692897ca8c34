use chrono::{DateTime, TimeDelta, Utc};

use super::AttemptInfo;

/// Counter and window start for one caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBucket {
    count: i64,
    window_started_at: DateTime<Utc>,
}

impl RateBucket {
    /// Opens a bucket for the first request seen from a key.
    #[must_use]
    pub fn open(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            window_started_at: now,
        }
    }

    /// Counts one more request at `now`.
    ///
    /// Starts a new window when strictly more than `window` has elapsed since
    /// the current one opened; otherwise increments the counter.
    pub fn record(&mut self, now: DateTime<Utc>, window: TimeDelta) {
        if now - self.window_started_at > window {
            *self = Self::open(now);
            return;
        }

        self.count = self.count.saturating_add(1);
    }

    /// Returns whether the window opened before `cutoff`.
    #[must_use]
    pub fn started_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.window_started_at < cutoff
    }

    /// Snapshot of the bucket.
    #[must_use]
    pub fn attempt_info(&self) -> AttemptInfo {
        AttemptInfo {
            attempt_count: self.count,
            window_started_at: self.window_started_at,
        }
    }
}
