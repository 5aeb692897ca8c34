//! PostgreSQL-backed order repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use storefront_application::{NewOrder, OrderDeletion, OrderRecord, OrderRepository};
use storefront_core::{AppError, AppResult};
use storefront_domain::{OrderId, OrderNumber, OrderStatus, ProductId, UserId};

use crate::postgres_product_repository::release_unit;

/// PostgreSQL implementation of the order repository port.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Allocates the next sequence value and its formatted order number.
    async fn next_order_number(&self) -> AppResult<(i64, OrderNumber)> {
        let sequence = sqlx::query_scalar::<_, i64>("SELECT nextval('order_number_seq')")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to allocate order number: {error}"))
            })?;

        let value = u64::try_from(sequence).map_err(|error| {
            AppError::Internal(format!("order number sequence returned {sequence}: {error}"))
        })?;
        Ok((sequence, OrderNumber::from_sequence(value)))
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: Uuid,
    username: String,
    product_id: Uuid,
    product_name: String,
    price: f64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::from_uuid(row.id),
            order_number: OrderNumber::parse(row.order_number)?,
            user_id: UserId::from_uuid(row.user_id),
            username: row.username,
            product_id: ProductId::from_uuid(row.product_id),
            product_name: row.product_name,
            price: row.price,
            status: OrderStatus::from_str(row.status.as_str())?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create(&self, order: NewOrder) -> AppResult<OrderRecord> {
        let (sequence, order_number) = self.next_order_number().await?;
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (
                id,
                order_sequence,
                order_number,
                user_id,
                username,
                product_id,
                product_name,
                price,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id,
                order_number,
                user_id,
                username,
                product_id,
                product_name,
                price,
                status,
                created_at,
                updated_at
            "#,
        )
        .bind(OrderId::new().as_uuid())
        .bind(sequence)
        .bind(order_number.as_str())
        .bind(order.user_id.as_uuid())
        .bind(order.username.as_str())
        .bind(order.product_id.as_uuid())
        .bind(order.product_name.as_str())
        .bind(order.price)
        .bind(order.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create order: {error}")))?;

        row.try_into()
    }

    async fn list(&self, user_id: Option<UserId>) -> AppResult<Vec<OrderRecord>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT
                id,
                order_number,
                user_id,
                username,
                product_id,
                product_name,
                price,
                status,
                created_at,
                updated_at
            FROM orders
            WHERE ($1::UUID IS NULL OR user_id = $1)
            ORDER BY created_at DESC, order_sequence DESC
            "#,
        )
        .bind(user_id.map(|user_id| user_id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list orders: {error}")))?;

        rows.into_iter().map(OrderRecord::try_from).collect()
    }

    async fn delete_and_release(&self, order_id: OrderId) -> AppResult<Option<OrderDeletion>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start delete transaction for order '{order_id}': {error}"
            ))
        })?;

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            DELETE FROM orders
            WHERE id = $1
            RETURNING
                id,
                order_number,
                user_id,
                username,
                product_id,
                product_name,
                price,
                status,
                created_at,
                updated_at
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete order '{order_id}': {error}"))
        })?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = OrderRecord::try_from(row)?;

        // Dropping the transaction on error rolls the delete back.
        let restocked = release_unit(&mut transaction, order.product_id).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit delete transaction for order '{order_id}': {error}"
            ))
        })?;

        Ok(Some(OrderDeletion { order, restocked }))
    }
}

#[cfg(test)]
mod tests {
    use storefront_application::{
        NewOrder, NewProduct, NewUser, OrderRepository, ProductRecord, ProductRepository,
        UserRecord, UserRepository,
    };
    use storefront_core::{AppError, AppResult, Role};
    use storefront_domain::{OrderStatus, Price, ProductName, Stock, Username};

    use super::PostgresOrderRepository;
    use crate::{PostgresProductRepository, PostgresUserRepository, test_pool};

    async fn owner(users: &PostgresUserRepository) -> AppResult<UserRecord> {
        let username = format!("buyer-{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
        users
            .create(NewUser {
                username: Username::new(username.as_str())?,
                password_hash: "hash".to_owned(),
                roles: vec![Role::User],
            })
            .await
    }

    fn order_of(user: &UserRecord, product: &ProductRecord) -> NewOrder {
        NewOrder {
            user_id: user.id,
            username: user.username.clone(),
            product_id: product.id,
            product_name: product.name.clone(),
            price: product.price,
            status: OrderStatus::Pending,
        }
    }

    #[tokio::test]
    async fn delete_returns_unit_once_and_keeps_order_on_failed_restock() -> AppResult<()> {
        let Some(pool) = test_pool().await else {
            return Ok(());
        };

        let users = PostgresUserRepository::new(pool.clone());
        let products = PostgresProductRepository::new(pool.clone());
        let orders = PostgresOrderRepository::new(pool);
        let user = owner(&users).await?;

        let product = products
            .create(NewProduct {
                name: ProductName::new("Chair")?,
                price: Price::new(80.0)?,
                stock: Stock::new(0)?,
            })
            .await?;
        let order = orders.create(order_of(&user, &product)).await?;

        let deletion = orders.delete_and_release(order.id).await?;
        assert_eq!(deletion.map(|deletion| deletion.restocked), Some(true));
        assert!(orders.delete_and_release(order.id).await?.is_none());
        let stored = products.find_by_id(product.id).await?;
        assert_eq!(stored.map(|product| product.stock), Some(1));

        let full = products
            .create(NewProduct {
                name: ProductName::new("Crate")?,
                price: Price::new(2.0)?,
                stock: Stock::new(i64::from(u32::MAX))?,
            })
            .await?;
        let blocked = orders.create(order_of(&user, &full)).await?;

        let result = orders.delete_and_release(blocked.id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        let remaining = orders.list(Some(user.id)).await?;
        assert!(remaining.iter().any(|order| order.id == blocked.id));
        Ok(())
    }

    #[tokio::test]
    async fn same_timestamp_orders_list_by_numeric_sequence() -> AppResult<()> {
        let Some(pool) = test_pool().await else {
            return Ok(());
        };

        let users = PostgresUserRepository::new(pool.clone());
        let products = PostgresProductRepository::new(pool.clone());
        let orders = PostgresOrderRepository::new(pool.clone());
        let user = owner(&users).await?;
        let product = products
            .create(NewProduct {
                name: ProductName::new("Pen")?,
                price: Price::new(1.5)?,
                stock: Stock::new(10)?,
            })
            .await?;

        let first = orders.create(order_of(&user, &product)).await?;
        let second = orders.create(order_of(&user, &product)).await?;
        sqlx::query("UPDATE orders SET created_at = $2 WHERE user_id = $1")
            .bind(user.id.as_uuid())
            .bind(first.created_at)
            .execute(&pool)
            .await
            .map_err(|error| AppError::Internal(error.to_string()))?;

        let listed = orders.list(Some(user.id)).await?;
        let ids = listed.iter().map(|order| order.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![second.id, first.id]);
        Ok(())
    }
}
