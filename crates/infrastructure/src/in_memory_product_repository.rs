//! Process-local product repository.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use storefront_application::{NewProduct, ProductRecord, ProductRepository};
use storefront_core::{AppError, AppResult};
use storefront_domain::ProductId;

/// In-memory implementation of the product repository port.
///
/// `reserve_one` and `release_one` each run inside one write-lock critical
/// section, which is the in-process equivalent of a conditional update.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<ProductRecord>>,
}

impl InMemoryProductRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: NewProduct) -> AppResult<ProductRecord> {
        let now = Utc::now();
        let record = ProductRecord {
            id: ProductId::new(),
            name: product.name.into(),
            price: product.price.value(),
            stock: product.stock.units(),
            created_at: now,
            updated_at: now,
        };

        self.products.write().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> AppResult<Vec<ProductRecord>> {
        Ok(self.products.read().await.clone())
    }

    async fn find_by_id(&self, product_id: ProductId) -> AppResult<Option<ProductRecord>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|product| product.id == product_id)
            .cloned())
    }

    async fn delete(&self, product_id: ProductId) -> AppResult<bool> {
        let mut products = self.products.write().await;
        let initial = products.len();
        products.retain(|product| product.id != product_id);
        Ok(products.len() != initial)
    }

    async fn reserve_one(&self, product_id: ProductId) -> AppResult<Option<ProductRecord>> {
        let mut products = self.products.write().await;
        let Some(product) = products
            .iter_mut()
            .find(|product| product.id == product_id && product.stock > 0)
        else {
            return Ok(None);
        };

        product.stock -= 1;
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn release_one(&self, product_id: ProductId) -> AppResult<bool> {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|product| product.id == product_id) else {
            return Ok(false);
        };

        product.stock = product
            .stock
            .checked_add(1)
            .ok_or_else(|| AppError::Conflict("Product stock is at its maximum".to_owned()))?;
        product.updated_at = Utc::now();
        Ok(true)
    }
}
