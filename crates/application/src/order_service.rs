//! Order ports and application service.
//!
//! Every order holds exactly one unit of stock from one product for its whole
//! lifetime: creation reserves the unit before the order row exists, deletion
//! removes the row and releases the unit as one storage step.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_core::{AppError, AppResult, Role, UserIdentity};
use storefront_domain::{OrderId, OrderNumber, OrderStatus, ProductId, UserId};

use crate::{ProductService, require_role};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Order as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// Unique order identifier.
    pub id: OrderId,
    /// Human-facing number, e.g. `ORD-0042`.
    pub order_number: OrderNumber,
    /// Owner of the order.
    pub user_id: UserId,
    /// Owner's username at order time.
    pub username: String,
    /// Product the reserved unit belongs to.
    pub product_id: ProductId,
    /// Product name at order time.
    pub product_name: String,
    /// Unit price at order time.
    pub price: f64,
    /// Fulfilment status.
    pub status: OrderStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Order ready to be persisted. The repository allocates id and number.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// Owner of the order.
    pub user_id: UserId,
    /// Owner's username.
    pub username: String,
    /// Reserved product.
    pub product_id: ProductId,
    /// Product name snapshot.
    pub product_name: String,
    /// Unit price snapshot.
    pub price: f64,
    /// Initial status.
    pub status: OrderStatus,
}

/// Repository port for orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists an order, allocating the next order number.
    async fn create(&self, order: NewOrder) -> AppResult<OrderRecord>;

    /// Lists orders newest first, optionally restricted to one owner.
    async fn list(&self, user_id: Option<UserId>) -> AppResult<Vec<OrderRecord>>;

    /// Removes an order and returns its unit to the product in one atomic
    /// step. Concurrent deletes of the same order see `Some` at most once.
    ///
    /// When the unit cannot be returned the order stays in place and the
    /// error is propagated. A product that no longer exists is not an error;
    /// the deletion then reports `restocked == false`.
    async fn delete_and_release(&self, order_id: OrderId) -> AppResult<Option<OrderDeletion>>;
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Input for order creation.
#[derive(Debug, Clone, Copy)]
pub struct CreateOrderInput {
    /// Product to reserve one unit of.
    pub product_id: ProductId,
    /// Initial status; defaults to pending.
    pub status: Option<OrderStatus>,
}

/// Outcome of an order deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDeletion {
    /// The removed order.
    pub order: OrderRecord,
    /// Whether the reserved unit went back to its product. `false` when the
    /// product was deleted in the meantime.
    pub restocked: bool,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for orders.
#[derive(Clone)]
pub struct OrderService {
    order_repository: Arc<dyn OrderRepository>,
    product_service: ProductService,
}

impl OrderService {
    /// Creates a new order service.
    #[must_use]
    pub fn new(order_repository: Arc<dyn OrderRepository>, product_service: ProductService) -> Self {
        Self {
            order_repository,
            product_service,
        }
    }

    /// Reserves one unit of the product and records the order.
    ///
    /// When the order cannot be persisted the reserved unit is released
    /// before the error is returned.
    pub async fn create_order(
        &self,
        actor: &UserIdentity,
        input: CreateOrderInput,
    ) -> AppResult<OrderRecord> {
        let user_id = actor_user_id(actor)?;
        let product = self.product_service.reserve_one(input.product_id).await?;

        let order = NewOrder {
            user_id,
            username: actor.username().to_owned(),
            product_id: product.id,
            product_name: product.name,
            price: product.price,
            status: input.status.unwrap_or_default(),
        };

        match self.order_repository.create(order).await {
            Ok(order) => Ok(order),
            Err(error) => {
                if let Err(release_error) = self.product_service.release_one(product.id).await {
                    return Err(AppError::Internal(format!(
                        "{error}; failed to release reserved unit: {release_error}"
                    )));
                }
                Err(error)
            }
        }
    }

    /// Lists orders visible to the actor: all of them for admins, the
    /// actor's own otherwise.
    pub async fn list_orders(&self, actor: &UserIdentity) -> AppResult<Vec<OrderRecord>> {
        let owner = if actor.is_admin() {
            None
        } else {
            Some(actor_user_id(actor)?)
        };

        self.order_repository.list(owner).await
    }

    /// Deletes an order and returns its unit to stock. Admin only.
    pub async fn delete_order(
        &self,
        actor: &UserIdentity,
        order_id: OrderId,
    ) -> AppResult<OrderDeletion> {
        require_role(actor, Role::Admin)?;

        self.order_repository
            .delete_and_release(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))
    }
}

fn actor_user_id(actor: &UserIdentity) -> AppResult<UserId> {
    UserId::from_str(actor.subject())
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_owned()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storefront_core::{AppError, AppResult, Role, UserIdentity};
    use storefront_domain::{OrderId, OrderStatus, ProductId, UserId};

    use crate::test_support::{FakeOrderRepository, FakeProductRepository, admin, shopper};
    use crate::{CreateProductInput, ProductRecord, ProductService};

    use super::{CreateOrderInput, OrderService};

    struct Fixture {
        orders: Arc<FakeOrderRepository>,
        product_store: Arc<FakeProductRepository>,
        products: ProductService,
        service: OrderService,
    }

    fn fixture() -> Fixture {
        let product_store = Arc::new(FakeProductRepository::default());
        let orders = Arc::new(FakeOrderRepository::new(product_store.clone()));
        let products = ProductService::new(product_store.clone());
        Fixture {
            service: OrderService::new(orders.clone(), products.clone()),
            orders,
            product_store,
            products,
        }
    }

    async fn stocked_product(products: &ProductService, stock: i64) -> AppResult<ProductRecord> {
        products
            .create_product(
                &admin(),
                CreateProductInput {
                    name: "Desk".to_owned(),
                    price: 120.0,
                    stock: Some(stock),
                },
            )
            .await
    }

    fn order_for(product_id: ProductId) -> CreateOrderInput {
        CreateOrderInput {
            product_id,
            status: None,
        }
    }

    #[tokio::test]
    async fn creating_order_reserves_stock_and_snapshots_product() -> AppResult<()> {
        let fixture = fixture();
        let product = stocked_product(&fixture.products, 2).await?;
        let actor = shopper();

        let order = fixture
            .service
            .create_order(&actor, order_for(product.id))
            .await?;

        assert_eq!(order.order_number.as_str(), "ORD-0001");
        assert_eq!(order.product_name, "Desk");
        assert_eq!(order.username, "alice");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(fixture.products.get_product(product.id).await?.stock, 1);
        Ok(())
    }

    #[tokio::test]
    async fn explicit_status_is_kept() -> AppResult<()> {
        let fixture = fixture();
        let product = stocked_product(&fixture.products, 1).await?;

        let order = fixture
            .service
            .create_order(
                &shopper(),
                CreateOrderInput {
                    product_id: product.id,
                    status: Some(OrderStatus::Processing),
                },
            )
            .await?;

        assert_eq!(order.status, OrderStatus::Processing);
        Ok(())
    }

    #[tokio::test]
    async fn out_of_stock_product_creates_no_order() -> AppResult<()> {
        let fixture = fixture();
        let product = stocked_product(&fixture.products, 0).await?;
        let actor = admin();

        let result = fixture
            .service
            .create_order(&actor, order_for(product.id))
            .await;

        assert!(matches!(result, Err(AppError::OutOfStock(_))));
        assert!(fixture.service.list_orders(&actor).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let fixture = fixture();
        let result = fixture
            .service
            .create_order(&shopper(), order_for(ProductId::new()))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn failed_insert_releases_reserved_unit() -> AppResult<()> {
        let fixture = fixture();
        let product = stocked_product(&fixture.products, 1).await?;
        fixture.orders.fail_next_creates();

        let result = fixture
            .service
            .create_order(&shopper(), order_for(product.id))
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(fixture.products.get_product(product.id).await?.stock, 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_compensating_release_is_reported_as_internal() -> AppResult<()> {
        let fixture = fixture();
        let product = stocked_product(&fixture.products, 1).await?;
        fixture.orders.fail_next_creates();
        fixture.product_store.fail_next_releases();

        let result = fixture
            .service
            .create_order(&shopper(), order_for(product.id))
            .await;

        let Err(AppError::Internal(message)) = result else {
            panic!("expected an internal error, got {result:?}");
        };
        assert!(message.contains("failed to insert order"));
        assert!(message.contains("failed to release reserved unit"));
        assert!(fixture.service.list_orders(&admin()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn non_admins_only_see_their_own_orders() -> AppResult<()> {
        let fixture = fixture();
        let product = stocked_product(&fixture.products, 5).await?;
        let alice = shopper();
        let bob = UserIdentity::new(UserId::new().to_string(), "bob", vec![Role::User]);

        fixture
            .service
            .create_order(&alice, order_for(product.id))
            .await?;
        fixture
            .service
            .create_order(&bob, order_for(product.id))
            .await?;
        fixture
            .service
            .create_order(&alice, order_for(product.id))
            .await?;

        let visible = fixture.service.list_orders(&alice).await?;
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|order| order.username == "alice"));
        assert_eq!(visible[0].order_number.as_str(), "ORD-0003");

        assert_eq!(fixture.service.list_orders(&admin()).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_order_restocks_product_once() -> AppResult<()> {
        let fixture = fixture();
        let product = stocked_product(&fixture.products, 1).await?;
        let order = fixture
            .service
            .create_order(&shopper(), order_for(product.id))
            .await?;

        let deletion = fixture.service.delete_order(&admin(), order.id).await?;
        assert!(deletion.restocked);
        assert_eq!(fixture.products.get_product(product.id).await?.stock, 1);

        let again = fixture.service.delete_order(&admin(), order.id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
        assert_eq!(fixture.products.get_product(product.id).await?.stock, 1);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_order_of_removed_product_skips_restock() -> AppResult<()> {
        let fixture = fixture();
        let product = stocked_product(&fixture.products, 1).await?;
        let order = fixture
            .service
            .create_order(&shopper(), order_for(product.id))
            .await?;
        fixture.products.delete_product(&admin(), product.id).await?;

        let deletion = fixture.service.delete_order(&admin(), order.id).await?;
        assert!(!deletion.restocked);
        Ok(())
    }

    #[tokio::test]
    async fn failed_restock_keeps_order_and_stock() -> AppResult<()> {
        let fixture = fixture();
        let product = stocked_product(&fixture.products, 1).await?;
        let order = fixture
            .service
            .create_order(&shopper(), order_for(product.id))
            .await?;
        fixture.product_store.fail_next_releases();

        let result = fixture.service.delete_order(&admin(), order.id).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        let remaining = fixture.service.list_orders(&admin()).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, order.id);
        assert_eq!(fixture.products.get_product(product.id).await?.stock, 0);
        Ok(())
    }

    #[tokio::test]
    async fn only_admins_delete_orders() {
        let fixture = fixture();
        let result = fixture
            .service
            .delete_order(&shopper(), OrderId::new())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
