//! Product catalog ports and the stock reservation service.
//!
//! Stock is only ever adjusted through the repository's atomic
//! `reserve_one` / `release_one` primitives. The service never reads a stock
//! level and writes a new one back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_core::{AppError, AppResult, Role, UserIdentity};
use storefront_domain::{Price, ProductId, ProductName, Stock};

use crate::require_role;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Product as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    /// Unique product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: f64,
    /// Units available for reservation.
    pub stock: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Validated product ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    /// Display name.
    pub name: ProductName,
    /// Unit price.
    pub price: Price,
    /// Initial stock.
    pub stock: Stock,
}

/// Repository port for products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persists a new product.
    async fn create(&self, product: NewProduct) -> AppResult<ProductRecord>;

    /// Lists every product, oldest first.
    async fn list(&self) -> AppResult<Vec<ProductRecord>>;

    /// Finds a product by identifier.
    async fn find_by_id(&self, product_id: ProductId) -> AppResult<Option<ProductRecord>>;

    /// Deletes a product. Returns whether a row was removed.
    async fn delete(&self, product_id: ProductId) -> AppResult<bool>;

    /// Decrements stock by one if and only if it is positive, in one atomic
    /// step. Returns the updated product, or `None` when the product is
    /// unknown or out of stock.
    async fn reserve_one(&self, product_id: ProductId) -> AppResult<Option<ProductRecord>>;

    /// Increments stock by one in one atomic step. Returns `false` when the
    /// product no longer exists and a conflict when stock is already at
    /// `u32::MAX`.
    async fn release_one(&self, product_id: ProductId) -> AppResult<bool>;
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Unvalidated input for product creation.
#[derive(Debug, Clone)]
pub struct CreateProductInput {
    /// Raw name.
    pub name: String,
    /// Raw price.
    pub price: f64,
    /// Initial stock; defaults to zero.
    pub stock: Option<i64>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for the product catalog and stock reservation.
#[derive(Clone)]
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
}

impl ProductService {
    /// Creates a new product service.
    #[must_use]
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    /// Creates a product. Admin only.
    pub async fn create_product(
        &self,
        actor: &UserIdentity,
        input: CreateProductInput,
    ) -> AppResult<ProductRecord> {
        require_role(actor, Role::Admin)?;

        let product = NewProduct {
            name: ProductName::new(input.name)?,
            price: Price::new(input.price)?,
            stock: Stock::new(input.stock.unwrap_or(0))?,
        };

        self.repository.create(product).await
    }

    /// Lists the catalog.
    pub async fn list_products(&self) -> AppResult<Vec<ProductRecord>> {
        self.repository.list().await
    }

    /// Returns one product or `NotFound`.
    pub async fn get_product(&self, product_id: ProductId) -> AppResult<ProductRecord> {
        self.repository
            .find_by_id(product_id)
            .await?
            .ok_or_else(product_not_found)
    }

    /// Deletes a product. Admin only. Returns whether it existed.
    pub async fn delete_product(
        &self,
        actor: &UserIdentity,
        product_id: ProductId,
    ) -> AppResult<bool> {
        require_role(actor, Role::Admin)?;
        self.repository.delete(product_id).await
    }

    /// Claims one unit of stock.
    ///
    /// The decision is made by the atomic repository step alone. The follow-up
    /// lookup only chooses between `NotFound` and `OutOfStock`.
    pub async fn reserve_one(&self, product_id: ProductId) -> AppResult<ProductRecord> {
        if let Some(product) = self.repository.reserve_one(product_id).await? {
            return Ok(product);
        }

        match self.repository.find_by_id(product_id).await? {
            Some(_) => Err(AppError::OutOfStock("Product is out of stock".to_owned())),
            None => Err(product_not_found()),
        }
    }

    /// Returns one unit of stock. Returns `false` when the product is gone.
    pub async fn release_one(&self, product_id: ProductId) -> AppResult<bool> {
        self.repository.release_one(product_id).await
    }
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_owned())
}
