//! Transaction - validated, immutable submission

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::amount::TransactionAmount;
use crate::error::ValidationError;
use crate::location::Location;

/// Optional type tag carried by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionKind {
    Transfer,
    Payment,
    Recharge,
    Deposit,
    Other(String),
}

impl TransactionKind {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionKind::Transfer => "transfer",
            TransactionKind::Payment => "payment",
            TransactionKind::Recharge => "recharge",
            TransactionKind::Deposit => "deposit",
            TransactionKind::Other(s) => s,
        }
    }

    /// Apply the direction convention to an unsigned amount.
    ///
    /// Transfers, payments and recharges are outflows (negative), deposits
    /// are inflows (positive). Unknown kinds keep the sign they were given.
    pub fn signed_amount(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Transfer | TransactionKind::Payment | TransactionKind::Recharge => {
                -amount.abs()
            }
            TransactionKind::Deposit => amount.abs(),
            TransactionKind::Other(_) => amount,
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "transfer" => TransactionKind::Transfer,
            "payment" => TransactionKind::Payment,
            "recharge" => TransactionKind::Recharge,
            "deposit" => TransactionKind::Deposit,
            _ => TransactionKind::Other(s.trim().to_string()),
        })
    }
}

impl From<String> for TransactionKind {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<TransactionKind> for String {
    fn from(kind: TransactionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction submitted for evaluation.
///
/// Fields are private; once built, a transaction is treated as a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    transaction_id: String,
    amount: TransactionAmount,
    user_id: String,
    location: Location,
    timestamp: DateTime<Utc>,
    device_id: Option<String>,
    kind: Option<TransactionKind>,
    description: Option<String>,
}

impl Transaction {
    /// Build a transaction, rejecting blank identifiers
    pub fn new(
        transaction_id: impl Into<String>,
        amount: TransactionAmount,
        user_id: impl Into<String>,
        location: Location,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let transaction_id = transaction_id.into();
        let user_id = user_id.into();

        if transaction_id.trim().is_empty() {
            return Err(ValidationError::BlankField("transaction_id"));
        }
        if user_id.trim().is_empty() {
            return Err(ValidationError::BlankField("user_id"));
        }

        Ok(Self {
            transaction_id,
            amount,
            user_id,
            location,
            timestamp,
            device_id: None,
            kind: None,
            description: None,
        })
    }

    /// Attach a device fingerprint. Blank ids are treated as absent.
    pub fn with_device_id(mut self, device_id: Option<String>) -> Self {
        self.device_id = device_id.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_kind(mut self, kind: Option<TransactionKind>) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn amount(&self) -> TransactionAmount {
        self.amount
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn kind(&self) -> Option<&TransactionKind> {
        self.kind.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Transaction {
        Transaction::new(
            "TX-001",
            TransactionAmount::new(dec!(-100)).unwrap(),
            "USER-001",
            Location::new(40.0, -74.0).unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_blank_ids_rejected() {
        let amount = TransactionAmount::new(dec!(10)).unwrap();
        let loc = Location::new(0.0, 0.0).unwrap();

        let err = Transaction::new("  ", amount, "USER-001", loc, Utc::now()).unwrap_err();
        assert_eq!(err, ValidationError::BlankField("transaction_id"));

        let err = Transaction::new("TX-001", amount, "", loc, Utc::now()).unwrap_err();
        assert_eq!(err, ValidationError::BlankField("user_id"));
    }

    #[test]
    fn test_blank_device_is_absent() {
        let tx = sample().with_device_id(Some("   ".to_string()));
        assert_eq!(tx.device_id(), None);

        let tx = sample().with_device_id(Some("device-abc".to_string()));
        assert_eq!(tx.device_id(), Some("device-abc"));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Transfer".parse::<TransactionKind>().unwrap(), TransactionKind::Transfer);
        assert_eq!(
            "refund".parse::<TransactionKind>().unwrap(),
            TransactionKind::Other("refund".to_string())
        );
    }

    #[test]
    fn test_signed_amount_convention() {
        assert_eq!(TransactionKind::Payment.signed_amount(dec!(50)), dec!(-50));
        assert_eq!(TransactionKind::Recharge.signed_amount(dec!(-50)), dec!(-50));
        assert_eq!(TransactionKind::Deposit.signed_amount(dec!(-50)), dec!(50));
        assert_eq!(
            TransactionKind::Other("refund".to_string()).signed_amount(dec!(-7)),
            dec!(-7)
        );
    }
}
