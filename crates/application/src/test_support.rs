//! Fakes shared by the service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use storefront_core::{AppError, AppResult, Role, UserIdentity};
use storefront_domain::{OrderId, OrderNumber, ProductId, UserId};

use crate::{
    AccessTokenService, AuditLogEntry, AuditLogPage, AuditLogQuery, AuditLogRepository, Clock,
    NewOrder, NewProduct, NewUser, OrderDeletion, OrderRecord, OrderRepository, PasswordHasher,
    ProductRecord, ProductRepository, UserRecord, UserRepository,
};

fn lock<T>(mutex: &Mutex<T>) -> AppResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|error| AppError::Internal(format!("poisoned test state: {error}")))
}

pub fn admin() -> UserIdentity {
    UserIdentity::new(UserId::new().to_string(), "admin", vec![Role::User, Role::Admin])
}

pub fn shopper() -> UserIdentity {
    UserIdentity::new(UserId::new().to_string(), "alice", vec![Role::User])
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at_epoch() -> Self {
        Self {
            now: Mutex::new(Utc.timestamp_opt(0, 0).single().unwrap_or_default()),
        }
    }

    pub fn set_millis(&self, millis: i64) {
        if let Ok(mut now) = self.now.lock() {
            *now = Utc.timestamp_millis_opt(millis).single().unwrap_or_default();
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        if let Ok(mut now) = self.now.lock() {
            *now += delta;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_default()
    }
}

#[derive(Default)]
pub struct FakeProductRepository {
    products: Mutex<HashMap<ProductId, ProductRecord>>,
    fail_releases: Mutex<bool>,
}

impl FakeProductRepository {
    /// Makes every later release fail with an internal error.
    pub fn fail_next_releases(&self) {
        if let Ok(mut fail) = self.fail_releases.lock() {
            *fail = true;
        }
    }

    fn restock(&self, product_id: ProductId) -> AppResult<bool> {
        if *lock(&self.fail_releases)? {
            return Err(AppError::Internal("failed to release unit".to_owned()));
        }

        let mut products = lock(&self.products)?;
        let Some(product) = products.get_mut(&product_id) else {
            return Ok(false);
        };
        product.stock = product
            .stock
            .checked_add(1)
            .ok_or_else(|| AppError::Conflict("Product stock is at its maximum".to_owned()))?;
        Ok(true)
    }
}

#[async_trait]
impl ProductRepository for FakeProductRepository {
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
        lock(&self.products)?.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list(&self) -> AppResult<Vec<ProductRecord>> {
        Ok(lock(&self.products)?.values().cloned().collect())
    }

    async fn find_by_id(&self, product_id: ProductId) -> AppResult<Option<ProductRecord>> {
        Ok(lock(&self.products)?.get(&product_id).cloned())
    }

    async fn delete(&self, product_id: ProductId) -> AppResult<bool> {
        Ok(lock(&self.products)?.remove(&product_id).is_some())
    }

    async fn reserve_one(&self, product_id: ProductId) -> AppResult<Option<ProductRecord>> {
        Ok(lock(&self.products)?
            .get_mut(&product_id)
            .filter(|product| product.stock > 0)
            .map(|product| {
                product.stock -= 1;
                product.clone()
            }))
    }

    async fn release_one(&self, product_id: ProductId) -> AppResult<bool> {
        self.restock(product_id)
    }
}

/// Order store that restocks through a shared fake product store.
pub struct FakeOrderRepository {
    products: Arc<FakeProductRepository>,
    orders: Mutex<Vec<OrderRecord>>,
    fail_creates: Mutex<bool>,
}

impl FakeOrderRepository {
    pub fn new(products: Arc<FakeProductRepository>) -> Self {
        Self {
            products,
            orders: Mutex::new(Vec::new()),
            fail_creates: Mutex::new(false),
        }
    }

    pub fn fail_next_creates(&self) {
        if let Ok(mut fail) = self.fail_creates.lock() {
            *fail = true;
        }
    }
}

#[async_trait]
impl OrderRepository for FakeOrderRepository {
    async fn create(&self, order: NewOrder) -> AppResult<OrderRecord> {
        if *lock(&self.fail_creates)? {
            return Err(AppError::Internal("failed to insert order".to_owned()));
        }

        let mut orders = lock(&self.orders)?;
        let now = Utc::now();
        let record = OrderRecord {
            id: OrderId::new(),
            order_number: OrderNumber::from_sequence(orders.len() as u64 + 1),
            user_id: order.user_id,
            username: order.username,
            product_id: order.product_id,
            product_name: order.product_name,
            price: order.price,
            status: order.status,
            created_at: now,
            updated_at: now,
        };
        orders.push(record.clone());
        Ok(record)
    }

    async fn list(&self, user_id: Option<UserId>) -> AppResult<Vec<OrderRecord>> {
        Ok(lock(&self.orders)?
            .iter()
            .rev()
            .filter(|order| user_id.is_none_or(|user_id| order.user_id == user_id))
            .cloned()
            .collect())
    }

    async fn delete_and_release(&self, order_id: OrderId) -> AppResult<Option<OrderDeletion>> {
        let mut orders = lock(&self.orders)?;
        let Some(index) = orders.iter().position(|order| order.id == order_id) else {
            return Ok(None);
        };

        let restocked = self.products.restock(orders[index].product_id)?;
        let order = orders.remove(index);
        Ok(Some(OrderDeletion { order, restocked }))
    }
}

#[derive(Default)]
pub struct FakeUserRepository {
    users: Mutex<Vec<UserRecord>>,
}

#[async_trait]
impl UserRepository for FakeUserRepository {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        Ok(lock(&self.users)?
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(lock(&self.users)?
            .iter()
            .find(|user| user.id == user_id)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let mut users = lock(&self.users)?;
        if users
            .iter()
            .any(|existing| existing.username == user.username.as_str())
        {
            return Err(AppError::Conflict("User already exists".to_owned()));
        }

        let record = UserRecord {
            id: UserId::new(),
            username: user.username.into(),
            password_hash: user.password_hash,
            roles: user.roles,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> AppResult<Vec<UserRecord>> {
        Ok(lock(&self.users)?.clone())
    }
}

/// Reversible "hash" that records how often it was asked to hash.
#[derive(Default)]
pub struct FakePasswordHasher {
    hash_calls: Mutex<usize>,
}

impl FakePasswordHasher {
    pub fn hash_calls(&self) -> usize {
        self.hash_calls.lock().map(|calls| *calls).unwrap_or(0)
    }
}

impl PasswordHasher for FakePasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        *lock(&self.hash_calls)? += 1;
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("hashed:{password}"))
    }
}

/// Tokens are `subject|username|role,role`.
pub struct FakeTokenService;

impl AccessTokenService for FakeTokenService {
    fn issue(&self, identity: &UserIdentity) -> AppResult<String> {
        let roles = identity
            .roles()
            .iter()
            .map(|role| role.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Ok(format!(
            "{}|{}|{roles}",
            identity.subject(),
            identity.username()
        ))
    }

    fn verify(&self, token: &str) -> AppResult<UserIdentity> {
        let invalid = || AppError::Unauthorized("Invalid or expired token".to_owned());
        let mut parts = token.split('|');
        let subject = parts.next().ok_or_else(invalid)?;
        let username = parts.next().ok_or_else(invalid)?;
        let roles = parts
            .next()
            .ok_or_else(invalid)?
            .split(',')
            .map(|role| role.parse::<Role>().map_err(|_| invalid()))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(UserIdentity::new(subject, username, roles))
    }
}

#[derive(Default)]
pub struct FakeAuditLogRepository {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl FakeAuditLogRepository {
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditLogRepository for FakeAuditLogRepository {
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()> {
        lock(&self.entries)?.push(entry);
        Ok(())
    }

    async fn list(&self, query: &AuditLogQuery) -> AppResult<AuditLogPage> {
        let entries = lock(&self.entries)?;
        let matching = entries
            .iter()
            .rev()
            .filter(|entry| query.matches(entry))
            .collect::<Vec<_>>();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(AuditLogPage {
            entries: page,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }
}
