//! TransactionAmount - Signed, non-zero decimal wrapper
//!
//! The sign encodes direction: negative amounts leave the account
//! (transfers, payments, recharges), positive amounts enter it (deposits).
//! Zero is never a valid transaction amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// A signed, non-zero decimal amount.
///
/// # Invariant
/// The inner value is never zero. This is enforced by the constructor.
///
/// # Example
/// ```
/// use fraudguard_core::TransactionAmount;
/// use rust_decimal::Decimal;
///
/// let outflow = TransactionAmount::new(Decimal::new(-2000, 0)).unwrap();
/// assert_eq!(outflow.magnitude(), Decimal::new(2000, 0));
///
/// // Zero amounts are rejected
/// assert!(TransactionAmount::new(Decimal::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TransactionAmount(Decimal);

impl TransactionAmount {
    /// Create a new amount, rejecting zero
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value.is_zero() {
            Err(ValidationError::ZeroAmount)
        } else {
            Ok(Self(value))
        }
    }

    /// Get the inner Decimal value (signed)
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Absolute value, used by threshold comparisons
    #[inline]
    pub fn magnitude(&self) -> Decimal {
        self.0.abs()
    }
}

impl fmt::Display for TransactionAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for TransactionAmount {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TransactionAmount> for Decimal {
    fn from(amount: TransactionAmount) -> Self {
        amount.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = TransactionAmount::new(dec!(100)).unwrap();
        assert_eq!(amount.value(), dec!(100));
    }

    #[test]
    fn test_amount_negative_allowed() {
        let amount = TransactionAmount::new(dec!(-250.50)).unwrap();
        assert_eq!(amount.value(), dec!(-250.50));
        assert_eq!(amount.magnitude(), dec!(250.50));
    }

    #[test]
    fn test_amount_zero_rejected() {
        let result = TransactionAmount::new(Decimal::ZERO);
        assert!(matches!(result, Err(ValidationError::ZeroAmount)));
    }

    #[test]
    fn test_serde_rejects_zero() {
        let parsed: Result<TransactionAmount, _> = serde_json::from_str("\"0\"");
        assert!(parsed.is_err());

        let parsed: TransactionAmount = serde_json::from_str("\"123.45\"").unwrap();
        assert_eq!(parsed.value(), dec!(123.45));
    }
}
