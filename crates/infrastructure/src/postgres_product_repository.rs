//! PostgreSQL-backed product repository.
//!
//! Stock changes are single guarded `UPDATE` statements; the stock range
//! check constraint backs both guards at the storage layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use storefront_application::{NewProduct, ProductRecord, ProductRepository};
use storefront_core::{AppError, AppResult};
use storefront_domain::ProductId;

/// Largest stock a product can hold, `u32::MAX`.
const MAX_STOCK: i64 = 4_294_967_295;

/// Returns one unit to a product on the given connection, which may be an
/// open transaction. `Ok(false)` means the product is gone.
pub(crate) async fn release_unit(
    connection: &mut PgConnection,
    product_id: ProductId,
) -> AppResult<bool> {
    let released = sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE products
        SET stock = stock + 1, updated_at = now()
        WHERE id = $1 AND stock < $2
        RETURNING id
        "#,
    )
    .bind(product_id.as_uuid())
    .bind(MAX_STOCK)
    .fetch_optional(&mut *connection)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to release stock for product '{product_id}': {error}"
        ))
    })?;
    if released.is_some() {
        return Ok(true);
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)",
    )
    .bind(product_id.as_uuid())
    .fetch_one(&mut *connection)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to look up product '{product_id}': {error}"))
    })?;

    if exists {
        return Err(AppError::Conflict("Product stock is at its maximum".to_owned()));
    }
    Ok(false)
}

/// PostgreSQL implementation of the product repository port.
#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: f64,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for ProductRecord {
    type Error = AppError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let stock = u32::try_from(row.stock).map_err(|error| {
            AppError::Internal(format!(
                "product '{}' has invalid stock {}: {error}",
                row.id, row.stock
            ))
        })?;

        Ok(Self {
            id: ProductId::from_uuid(row.id),
            name: row.name,
            price: row.price,
            stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn create(&self, product: NewProduct) -> AppResult<ProductRecord> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (id, name, price, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, price, stock, created_at, updated_at
            "#,
        )
        .bind(ProductId::new().as_uuid())
        .bind(product.name.as_str())
        .bind(product.price.value())
        .bind(i64::from(product.stock.units()))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create product: {error}")))?;

        row.try_into()
    }

    async fn list(&self) -> AppResult<Vec<ProductRecord>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price, stock, created_at, updated_at
            FROM products
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list products: {error}")))?;

        rows.into_iter().map(ProductRecord::try_from).collect()
    }

    async fn find_by_id(&self, product_id: ProductId) -> AppResult<Option<ProductRecord>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price, stock, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find product '{product_id}': {error}"))
        })?;

        row.map(ProductRecord::try_from).transpose()
    }

    async fn delete(&self, product_id: ProductId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete product '{product_id}': {error}"))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn reserve_one(&self, product_id: ProductId) -> AppResult<Option<ProductRecord>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET stock = stock - 1, updated_at = now()
            WHERE id = $1 AND stock > 0
            RETURNING id, name, price, stock, created_at, updated_at
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to reserve stock for product '{product_id}': {error}"
            ))
        })?;

        row.map(ProductRecord::try_from).transpose()
    }

    async fn release_one(&self, product_id: ProductId) -> AppResult<bool> {
        let mut connection = self.pool.acquire().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to acquire connection to release stock for product '{product_id}': {error}"
            ))
        })?;

        release_unit(&mut connection, product_id).await
    }
}
