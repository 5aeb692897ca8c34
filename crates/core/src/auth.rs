use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Roles carried by an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular shopper.
    User,
    /// Back-office administrator.
    Admin,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

/// Authenticated caller, reconstructed from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    username: String,
    roles: Vec<Role>,
}

impl UserIdentity {
    /// Creates an identity from verified token claims.
    #[must_use]
    pub fn new(subject: impl Into<String>, username: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            subject: subject.into(),
            username: username.into(),
            roles,
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the login name of the user.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the roles granted to the user.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Returns whether the identity carries the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns whether the identity is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Role, UserIdentity};

    #[test]
    fn role_roundtrip_storage_value() {
        let restored = Role::from_str(Role::Admin.as_str());
        assert_eq!(restored.ok(), Some(Role::Admin));
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn identity_reports_admin_role() {
        let admin = UserIdentity::new("1", "root", vec![Role::User, Role::Admin]);
        let shopper = UserIdentity::new("2", "alice", vec![Role::User]);

        assert!(admin.is_admin());
        assert!(!shopper.is_admin());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap_or_default();
        assert_eq!(json, "\"admin\"");
    }
}
