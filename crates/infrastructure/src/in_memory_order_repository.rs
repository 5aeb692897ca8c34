//! Process-local order repository.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use storefront_application::{
    NewOrder, OrderDeletion, OrderRecord, OrderRepository, ProductRepository,
};
use storefront_core::AppResult;
use storefront_domain::{OrderId, OrderNumber, UserId};

use crate::InMemoryProductRepository;

/// In-memory implementation of the order repository port.
///
/// Deletion holds the order write lock while the unit is returned to the
/// shared product store. Locks are always taken orders first, then products.
#[derive(Debug)]
pub struct InMemoryOrderRepository {
    products: Arc<InMemoryProductRepository>,
    orders: RwLock<Vec<OrderRecord>>,
    sequence: AtomicU64,
}

impl InMemoryOrderRepository {
    /// Creates an empty repository that restocks into `products`.
    #[must_use]
    pub fn new(products: Arc<InMemoryProductRepository>) -> Self {
        Self {
            products,
            orders: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: NewOrder) -> AppResult<OrderRecord> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Utc::now();
        let record = OrderRecord {
            id: OrderId::new(),
            order_number: OrderNumber::from_sequence(sequence),
            user_id: order.user_id,
            username: order.username,
            product_id: order.product_id,
            product_name: order.product_name,
            price: order.price,
            status: order.status,
            created_at: now,
            updated_at: now,
        };

        self.orders.write().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self, user_id: Option<UserId>) -> AppResult<Vec<OrderRecord>> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .rev()
            .filter(|order| user_id.is_none_or(|user_id| order.user_id == user_id))
            .cloned()
            .collect())
    }

    async fn delete_and_release(&self, order_id: OrderId) -> AppResult<Option<OrderDeletion>> {
        let mut orders = self.orders.write().await;
        let Some(index) = orders.iter().position(|order| order.id == order_id) else {
            return Ok(None);
        };

        let restocked = self.products.release_one(orders[index].product_id).await?;
        let order = orders.remove(index);
        Ok(Some(OrderDeletion { order, restocked }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storefront_application::{
        CreateOrderInput, CreateProductInput, NewProduct, OrderService, ProductRepository,
        ProductService,
    };
    use storefront_core::{AppError, AppResult, Role, UserIdentity};
    use storefront_domain::{Price, ProductName, Stock, UserId};

    use super::InMemoryOrderRepository;
    use crate::InMemoryProductRepository;

    fn admin() -> UserIdentity {
        UserIdentity::new(UserId::new().to_string(), "root", vec![Role::Admin])
    }

    fn services() -> (Arc<InMemoryProductRepository>, ProductService, OrderService) {
        let store = Arc::new(InMemoryProductRepository::new());
        let products = ProductService::new(store.clone());
        let orders = OrderService::new(
            Arc::new(InMemoryOrderRepository::new(store.clone())),
            products.clone(),
        );
        (store, products, orders)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_restock_exactly_once() -> AppResult<()> {
        let (_, products, orders) = services();
        let actor = admin();

        let product = products
            .create_product(
                &actor,
                CreateProductInput {
                    name: "Monitor".to_owned(),
                    price: 199.0,
                    stock: Some(1),
                },
            )
            .await?;
        let order = orders
            .create_order(
                &actor,
                CreateOrderInput {
                    product_id: product.id,
                    status: None,
                },
            )
            .await?;
        assert_eq!(products.get_product(product.id).await?.stock, 0);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let orders = orders.clone();
            let actor = actor.clone();
            handles.push(tokio::spawn(async move {
                orders.delete_order(&actor, order.id).await
            }));
        }

        let mut deleted = 0;
        for handle in handles {
            if let Ok(Ok(_)) = handle.await {
                deleted += 1;
            }
        }

        assert_eq!(deleted, 1);
        assert_eq!(products.get_product(product.id).await?.stock, 1);
        Ok(())
    }

    #[tokio::test]
    async fn order_numbers_increase_monotonically() -> AppResult<()> {
        let (_, products, orders) = services();
        let actor = admin();
        let product = products
            .create_product(
                &actor,
                CreateProductInput {
                    name: "Cable".to_owned(),
                    price: 3.0,
                    stock: Some(3),
                },
            )
            .await?;

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let order = orders
                .create_order(
                    &actor,
                    CreateOrderInput {
                        product_id: product.id,
                        status: None,
                    },
                )
                .await?;
            numbers.push(order.order_number.to_string());
        }

        assert_eq!(numbers, ["ORD-0001", "ORD-0002", "ORD-0003"]);
        Ok(())
    }

    #[tokio::test]
    async fn failed_restock_leaves_order_in_place() -> AppResult<()> {
        let (store, products, orders) = services();
        let actor = admin();
        let product = store
            .create(NewProduct {
                name: ProductName::new("Lamp")?,
                price: Price::new(25.0)?,
                stock: Stock::new(i64::from(u32::MAX))?,
            })
            .await?;
        let order = orders
            .create_order(
                &actor,
                CreateOrderInput {
                    product_id: product.id,
                    status: None,
                },
            )
            .await?;
        assert!(store.release_one(product.id).await?);

        let result = orders.delete_order(&actor, order.id).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(orders.list_orders(&actor).await?.len(), 1);
        assert_eq!(products.get_product(product.id).await?.stock, u32::MAX);
        Ok(())
    }
}
