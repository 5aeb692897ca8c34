use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use storefront_core::AppError;

/// Audit action identifiers recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A visitor created an account.
    UserSignup,
    /// A user authenticated successfully.
    UserLogin,
    /// A login attempt failed.
    UserLoginFailed,
    /// A user signed out.
    UserLogout,
    /// An order was placed.
    OrderCreated,
    /// An administrator deleted an order.
    OrderDeleted,
    /// An administrator created a product.
    ProductCreated,
    /// An administrator deleted a product.
    ProductDeleted,
    /// An administrator created a user account.
    UserCreated,
    /// A user verified their email address.
    EmailVerified,
    /// A caller attempted an operation its role does not allow.
    UnauthorizedAccess,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserSignup => "USER_SIGNUP",
            Self::UserLogin => "USER_LOGIN",
            Self::UserLoginFailed => "USER_LOGIN_FAILED",
            Self::UserLogout => "USER_LOGOUT",
            Self::OrderCreated => "ORDER_CREATED",
            Self::OrderDeleted => "ORDER_DELETED",
            Self::ProductCreated => "PRODUCT_CREATED",
            Self::ProductDeleted => "PRODUCT_DELETED",
            Self::UserCreated => "USER_CREATED",
            Self::EmailVerified => "EMAIL_VERIFIED",
            Self::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AuditAction] = &[
            AuditAction::UserSignup,
            AuditAction::UserLogin,
            AuditAction::UserLoginFailed,
            AuditAction::UserLogout,
            AuditAction::OrderCreated,
            AuditAction::OrderDeleted,
            AuditAction::ProductCreated,
            AuditAction::ProductDeleted,
            AuditAction::UserCreated,
            AuditAction::EmailVerified,
            AuditAction::UnauthorizedAccess,
        ];

        ALL
    }
}

impl Display for AuditAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown audit action '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::AuditAction;

    #[test]
    fn every_action_roundtrips_through_storage_value() {
        for action in AuditAction::all() {
            assert_eq!(AuditAction::from_str(action.as_str()).ok(), Some(*action));
        }
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(AuditAction::from_str("ORDER_SHIPPED").is_err());
    }
}
