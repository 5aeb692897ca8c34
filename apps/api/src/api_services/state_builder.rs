use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;
use storefront_application::{
    AccessTokenService, AuditLogRepository, AuditLogService, Clock, OrderRepository,
    OrderService, PasswordHasher, ProductRepository, ProductService, RateLimitRepository,
    RateLimitRule, RateLimitService, SystemClock, UserRepository, UserService,
};
use storefront_core::AppError;
use storefront_infrastructure::{
    Argon2PasswordHasher, InMemoryRateLimitRepository, JwtTokenService,
    PostgresAuditLogRepository, PostgresOrderRepository, PostgresProductRepository,
    PostgresRateLimitRepository, PostgresUserRepository,
};

use crate::api_config::{ApiConfig, RateLimitStore};
use crate::state::AppState;

struct RepositorySet {
    users: Arc<dyn UserRepository>,
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    audit_logs: Arc<dyn AuditLogRepository>,
    rate_limits: Arc<dyn RateLimitRepository>,
}

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let rate_limits: Arc<dyn RateLimitRepository> = match config.rate_limit_store {
        RateLimitStore::Memory => Arc::new(InMemoryRateLimitRepository::new()),
        RateLimitStore::Postgres => Arc::new(PostgresRateLimitRepository::new(pool.clone())),
    };

    let repositories = RepositorySet {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        products: Arc::new(PostgresProductRepository::new(pool.clone())),
        orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
        audit_logs: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
        rate_limits,
    };
    let token_service =
        JwtTokenService::new(&config.jwt_secret, config.jwt_expires_in_seconds)?;

    Ok(assemble(
        repositories,
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(token_service),
        config.rate_limit_rule,
        Some(pool),
    ))
}

/// State backed entirely by process memory, with a cheap password hash.
#[cfg(test)]
pub fn build_in_memory_state(rule: RateLimitRule) -> Result<AppState, AppError> {
    use storefront_infrastructure::{
        InMemoryAuditLogRepository, InMemoryOrderRepository, InMemoryProductRepository,
        InMemoryUserRepository,
    };

    let products = Arc::new(InMemoryProductRepository::new());
    let repositories = RepositorySet {
        users: Arc::new(InMemoryUserRepository::new()),
        orders: Arc::new(InMemoryOrderRepository::new(products.clone())),
        products,
        audit_logs: Arc::new(InMemoryAuditLogRepository::new()),
        rate_limits: Arc::new(InMemoryRateLimitRepository::new()),
    };

    Ok(assemble(
        repositories,
        Arc::new(Argon2PasswordHasher::with_cost(1_024, 1, 1)?),
        Arc::new(JwtTokenService::new(
            "test-secret-test-secret-test-secret",
            3_600,
        )?),
        rule,
        None,
    ))
}

fn assemble(
    repositories: RepositorySet,
    password_hasher: Arc<dyn PasswordHasher>,
    token_service: Arc<dyn AccessTokenService>,
    rate_limit_rule: RateLimitRule,
    postgres_pool: Option<PgPool>,
) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let product_service = ProductService::new(repositories.products);

    AppState {
        user_service: UserService::new(repositories.users, password_hasher, token_service),
        order_service: OrderService::new(repositories.orders, product_service.clone()),
        product_service,
        audit_log_service: AuditLogService::new(repositories.audit_logs, clock.clone()),
        rate_limit_service: RateLimitService::new(
            repositories.rate_limits,
            clock,
            rate_limit_rule,
        ),
        postgres_pool,
        started_at: Instant::now(),
    }
}
