//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_log_service;
mod authorization;
mod clock;
mod order_service;
mod product_service;
mod rate_limit_service;
mod user_service;

#[cfg(test)]
mod test_support;

pub use audit_log_service::{
    AuditLogEntry, AuditLogInput, AuditLogPage, AuditLogQuery, AuditLogRepository,
    AuditLogService, ListAuditLogParams,
};
pub use authorization::require_role;
pub use clock::{Clock, SystemClock};
pub use order_service::{
    CreateOrderInput, NewOrder, OrderDeletion, OrderRecord, OrderRepository, OrderService,
};
pub use product_service::{
    CreateProductInput, NewProduct, ProductRecord, ProductRepository, ProductService,
};
pub use rate_limit_service::{
    AttemptInfo, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MS, RateBucket, RateLimitKey,
    RateLimitRepository, RateLimitRule, RateLimitService,
};
pub use user_service::{
    AccessTokenService, AuthOutcome, NewUser, PasswordHasher, SignupParams, UserRecord,
    UserRepository, UserService,
};
