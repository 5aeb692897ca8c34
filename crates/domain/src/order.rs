//! Order value types.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use storefront_core::AppError;

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order received, not yet handled.
    #[default]
    Pending,
    /// Order is being prepared.
    Processing,
    /// Order has been fulfilled.
    Completed,
}

impl OrderStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            _ => Err(AppError::Validation(format!(
                "order status must be one of pending, processing, completed; got '{value}'"
            ))),
        }
    }
}

/// Human-facing order reference such as `ORD-0042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderNumber(String);

impl OrderNumber {
    const PREFIX: &'static str = "ORD-";

    /// Formats the order number for a value allocated from a monotonic sequence.
    ///
    /// Numbers are zero-padded to four digits and grow beyond that as needed.
    #[must_use]
    pub fn from_sequence(value: u64) -> Self {
        Self(format!("{}{value:04}", Self::PREFIX))
    }

    /// Restores an order number read back from storage.
    pub fn parse(value: impl Into<String>) -> Result<Self, AppError> {
        let value = value.into();
        let digits = value.strip_prefix(Self::PREFIX).unwrap_or_default();
        if digits.is_empty() || !digits.chars().all(|character| character.is_ascii_digit()) {
            return Err(AppError::Validation(format!(
                "invalid order number '{value}'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the formatted order number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for OrderNumber {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}
