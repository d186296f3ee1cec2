//! Domain errors

use thiserror::Error;

use crate::evaluation::TransactionStatus;

/// Input that cannot become a domain value.
///
/// Always surfaced to the caller; never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid data format for {field}: {reason}")]
    MalformedField { field: String, reason: String },

    #[error("{0} cannot be empty")]
    BlankField(&'static str),

    #[error("Amount cannot be zero")]
    ZeroAmount,

    #[error("Latitude must be between -90 and 90, got {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude must be between -180 and 180, got {0}")]
    LongitudeOutOfRange(f64),

    #[error("Invalid decision '{0}'. Must be 'APPROVED' or 'REJECTED'")]
    InvalidDecision(String),

    #[error("{0} must be positive")]
    NonPositiveParameter(&'static str),

    #[error("{name} must be at most {max}")]
    ParameterTooLarge { name: &'static str, max: i64 },
}

impl ValidationError {
    /// Create a malformed-field error
    pub fn malformed(field: impl Into<String>, reason: impl ToString) -> Self {
        ValidationError::MalformedField {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

/// Transition attempted from a status that does not allow it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Transaction {transaction_id} is {status}, cannot authenticate")]
    NotPendingReview {
        transaction_id: String,
        status: TransactionStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_vs_malformed() {
        let missing = ValidationError::MissingField("amount".to_string());
        let malformed = ValidationError::malformed("amount", "not a number");

        assert_ne!(missing, malformed);
        assert_eq!(missing.to_string(), "Missing required field: amount");
        assert!(malformed.to_string().contains("amount"));
        assert!(malformed.to_string().contains("not a number"));
    }

    #[test]
    fn test_lifecycle_error_message() {
        let err = LifecycleError::NotPendingReview {
            transaction_id: "TX-001".to_string(),
            status: TransactionStatus::Approved,
        };
        assert!(err.to_string().contains("TX-001"));
        assert!(err.to_string().contains("APPROVED"));
    }
}
