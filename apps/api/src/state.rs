use std::time::Instant;

use sqlx::PgPool;
use storefront_application::{
    AuditLogService, OrderService, ProductService, RateLimitService, UserService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub product_service: ProductService,
    pub order_service: OrderService,
    pub audit_log_service: AuditLogService,
    pub rate_limit_service: RateLimitService,
    pub postgres_pool: Option<PgPool>,
    pub started_at: Instant,
}
