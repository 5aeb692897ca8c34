use chrono::TimeDelta;
use storefront_core::{AppError, AppResult};

/// Default window length: 15 minutes.
pub const DEFAULT_WINDOW_MS: u64 = 15 * 60 * 1000;

/// Default number of requests admitted per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 100;

/// Quota applied to every caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    window_ms: u64,
    max_requests: u32,
    window: TimeDelta,
}

impl RateLimitRule {
    /// Creates a rule admitting `max_requests` per `window_ms` milliseconds.
    pub fn new(window_ms: u64, max_requests: u32) -> AppResult<Self> {
        if window_ms == 0 {
            return Err(AppError::Validation(
                "rate limit window must be greater than zero".to_owned(),
            ));
        }

        if max_requests == 0 {
            return Err(AppError::Validation(
                "rate limit max requests must be greater than zero".to_owned(),
            ));
        }

        let window = i64::try_from(window_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .ok_or_else(|| {
                AppError::Validation(format!("rate limit window {window_ms}ms is too large"))
            })?;

        Ok(Self {
            window_ms,
            max_requests,
            window,
        })
    }

    /// Window length in milliseconds.
    #[must_use]
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Maximum number of requests admitted per window.
    #[must_use]
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Window length as a duration.
    #[must_use]
    pub fn window(&self) -> TimeDelta {
        self.window
    }
}

impl Default for RateLimitRule {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            max_requests: DEFAULT_MAX_REQUESTS,
            window: TimeDelta::minutes(15),
        }
    }
}
