//! Request and response bodies. JSON field names are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_application::{AuditLogEntry, AuditLogPage, OrderRecord, ProductRecord, UserRecord};
use storefront_core::{Role, UserIdentity};
use storefront_domain::{AuditAction, OrderStatus};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse<T> {
    pub message: &'static str,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserIdentityResponse {
    pub id: String,
    pub username: String,
    pub roles: Vec<Role>,
}

impl From<&UserIdentity> for UserIdentityResponse {
    fn from(identity: &UserIdentity) -> Self {
        Self {
            id: identity.subject().to_owned(),
            username: identity.username().to_owned(),
            roles: identity.roles().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            roles: user.roles,
            created_at: user.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: f64,
    pub stock: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            price: product.price,
            stock: product.stock,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Public projection returned by the single-product lookup.
#[derive(Debug, Serialize)]
pub struct ProductSummaryResponse {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl From<ProductRecord> for ProductSummaryResponse {
    fn from(product: ProductRecord) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            price: product.price,
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub product_id: String,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub id: String,
    pub order_number: String,
    pub product_name: String,
    pub price: f64,
    pub status: OrderStatus,
}

impl From<&OrderRecord> for OrderCreatedResponse {
    fn from(order: &OrderRecord) -> Self {
        Self {
            id: order.id.to_string(),
            order_number: order.order_number.to_string(),
            product_name: order.product_name.clone(),
            price: order.price,
            status: order.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub username: String,
    pub product_id: String,
    pub product_name: String,
    pub price: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            id: order.id.to_string(),
            order_number: order.order_number.to_string(),
            user_id: order.user_id.to_string(),
            username: order.username,
            product_id: order.product_id.to_string(),
            product_name: order.product_name,
            price: order.price,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub data: Vec<OrderResponse>,
    pub user: UserIdentityResponse,
}

// ---------------------------------------------------------------------------
// Audit logs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQueryParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub action: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub action: AuditAction,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status_code: u16,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogEntry> for AuditLogResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            user_id: entry.user_id.map(|user_id| user_id.to_string()),
            username: entry.username,
            action: entry.action,
            details: entry.details,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            status_code: entry.status_code,
            success: entry.success,
            error_message: entry.error_message,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct AuditLogListResponse {
    pub data: Vec<AuditLogResponse>,
    pub pagination: PaginationResponse,
}

impl From<AuditLogPage> for AuditLogListResponse {
    fn from(page: AuditLogPage) -> Self {
        let pagination = PaginationResponse {
            total: page.total,
            limit: page.limit,
            offset: page.offset,
            has_more: page.has_more(),
        };

        Self {
            data: page.entries.into_iter().map(AuditLogResponse::from).collect(),
            pagination,
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: HealthDependencyStatus,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
    pub checks: HealthChecks,
}
