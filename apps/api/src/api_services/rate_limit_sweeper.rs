use std::time::Duration;

use storefront_application::RateLimitService;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Periodically evicts rate limit buckets whose window has elapsed.
pub fn spawn_rate_limit_sweeper(service: RateLimitService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            match service.sweep().await {
                Ok(0) => {}
                Ok(evicted) => debug!(evicted, "evicted expired rate limit buckets"),
                Err(error) => warn!(error = %error, "rate limit sweep failed"),
            }
        }
    })
}
