//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod identifiers;
mod order;
mod product;
mod user;

pub use audit::AuditAction;
pub use identifiers::{OrderId, ProductId, UserId};
pub use order::{OrderNumber, OrderStatus};
pub use product::{Price, ProductName, Stock};
pub use user::{PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, Username, validate_password};
