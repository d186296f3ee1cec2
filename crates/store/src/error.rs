//! Store errors

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Evaluation not found: {0}")]
    NotFound(String),

    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("TTL out of range: {0}")]
    TtlOutOfRange(Duration),
}

impl StoreError {
    pub fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Corrupt {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Expiry instant for an entry written now
pub(crate) fn expires_at(ttl: Duration) -> StoreResult<DateTime<Utc>> {
    Utc::now()
        .checked_add_signed(ttl)
        .ok_or(StoreError::TtlOutOfRange(ttl))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_at() {
        let before = Utc::now();
        let at = expires_at(Duration::hours(1)).unwrap();
        assert!(at >= before + Duration::hours(1));

        let err = expires_at(Duration::days(1_000_000_000)).unwrap_err();
        assert!(matches!(err, StoreError::TtlOutOfRange(_)));
    }
}
