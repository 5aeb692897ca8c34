//! Request admission control.
//!
//! Every caller identity owns one bucket holding a request counter and the
//! instant its window opened. A request is admitted while the counter stays
//! within the configured quota; once the window has fully elapsed the next
//! request opens a fresh window. Rejected requests still count against the
//! window, so a client hammering the API does not earn itself a reset.

mod bucket;
mod config;
mod key;
mod ports;
mod service;


pub use bucket::RateBucket;
pub use config::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MS, RateLimitRule};
pub use key::RateLimitKey;
pub use ports::{AttemptInfo, RateLimitRepository};
pub use service::RateLimitService;
