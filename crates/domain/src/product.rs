//! Product catalog value types.

use storefront_core::{AppError, AppResult, NonEmptyString};

const PRODUCT_NAME_MIN_LENGTH: usize = 2;
const PRODUCT_NAME_MAX_LENGTH: usize = 200;

/// Validated, trimmed product display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductName(NonEmptyString);

impl ProductName {
    /// Creates a validated product name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let too_short = || {
            AppError::Validation(format!(
                "product name must be at least {PRODUCT_NAME_MIN_LENGTH} characters"
            ))
        };
        let name = NonEmptyString::new(value).map_err(|_| too_short())?;
        let char_count = name.as_str().chars().count();

        if char_count < PRODUCT_NAME_MIN_LENGTH {
            return Err(too_short());
        }

        if char_count > PRODUCT_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "product name must not exceed {PRODUCT_NAME_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(name))
    }

    /// Returns the validated name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ProductName> for String {
    fn from(value: ProductName) -> Self {
        value.0.into()
    }
}

/// Non-negative, finite unit price.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Price(f64);

impl Price {
    /// Creates a validated price.
    pub fn new(value: f64) -> AppResult<Self> {
        if !value.is_finite() {
            return Err(AppError::Validation(
                "price must be a finite number".to_owned(),
            ));
        }

        if value < 0.0 {
            return Err(AppError::Validation(
                "price must not be negative".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the raw price value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Number of units available for reservation. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Stock(u32);

impl Stock {
    /// Creates a stock level from an untrusted signed value.
    pub fn new(value: i64) -> AppResult<Self> {
        u32::try_from(value)
            .map(Self)
            .map_err(|_| AppError::Validation("stock must be between 0 and 4294967295".to_owned()))
    }

    /// Returns the number of units.
    #[must_use]
    pub fn units(&self) -> u32 {
        self.0
    }
}
