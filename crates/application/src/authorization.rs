use storefront_core::{AppError, AppResult, Role, UserIdentity};

/// Fails with `AppError::Forbidden` unless the actor carries `role`.
pub fn require_role(actor: &UserIdentity, role: Role) -> AppResult<()> {
    if actor.has_role(role) {
        return Ok(());
    }

    Err(AppError::Forbidden("Forbidden: insufficient role".to_owned()))
}

#[cfg(test)]
mod tests {
    use storefront_core::{AppError, Role, UserIdentity};

    use super::require_role;

    #[test]
    fn admin_passes_admin_check() {
        let admin = UserIdentity::new("1", "root", vec![Role::Admin]);
        assert!(require_role(&admin, Role::Admin).is_ok());
    }

    #[test]
    fn regular_user_is_forbidden() {
        let user = UserIdentity::new("2", "alice", vec![Role::User]);
        assert!(matches!(
            require_role(&user, Role::Admin),
            Err(AppError::Forbidden(_))
        ));
    }
}
