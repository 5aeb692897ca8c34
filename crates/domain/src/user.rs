//! User domain types and validation rules.

use storefront_core::{AppError, AppResult};

/// Minimum accepted password length.
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// Maximum password length (bounds the cost of Argon2id hashing).
pub const PASSWORD_MAX_LENGTH: usize = 128;

const USERNAME_MIN_LENGTH: usize = 3;
const USERNAME_MAX_LENGTH: usize = 64;

/// Validated, trimmed login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Creates a validated username.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        let char_count = trimmed.chars().count();

        if char_count < USERNAME_MIN_LENGTH {
            return Err(AppError::Validation(format!(
                "username must be at least {USERNAME_MIN_LENGTH} characters"
            )));
        }

        if char_count > USERNAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "username must not exceed {USERNAME_MAX_LENGTH} characters"
            )));
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(
                "username must not contain whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the validated username.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// Validates a plaintext password against the length rules.
pub fn validate_password(password: &str) -> AppResult<()> {
    let char_count = password.chars().count();

    if char_count < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }

    if char_count > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {PASSWORD_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}
