//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod in_memory_audit_log_repository;
mod in_memory_order_repository;
mod in_memory_product_repository;
mod in_memory_rate_limit_repository;
mod in_memory_user_repository;
mod jwt_token_service;
mod postgres_audit_log_repository;
mod postgres_order_repository;
mod postgres_product_repository;
mod postgres_rate_limit_repository;
mod postgres_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use in_memory_audit_log_repository::InMemoryAuditLogRepository;
pub use in_memory_order_repository::InMemoryOrderRepository;
pub use in_memory_product_repository::InMemoryProductRepository;
pub use in_memory_rate_limit_repository::InMemoryRateLimitRepository;
pub use in_memory_user_repository::InMemoryUserRepository;
pub use jwt_token_service::{JwtTokenService, MIN_SECRET_LENGTH};
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_order_repository::PostgresOrderRepository;
pub use postgres_product_repository::PostgresProductRepository;
pub use postgres_rate_limit_repository::PostgresRateLimitRepository;
pub use postgres_user_repository::PostgresUserRepository;

/// Connects to `DATABASE_URL` and applies migrations, or returns `None` when
/// the variable is unset so database tests skip cleanly.
#[cfg(test)]
async fn test_pool() -> Option<sqlx::PgPool> {
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres tests: {error}");
    }

    Some(pool)
}
