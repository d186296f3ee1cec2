//! Raw transaction payload and its validation
//!
//! Fields are kept loosely typed so that a missing field and a field of
//! the wrong shape produce different errors.

use chrono::{DateTime, NaiveDateTime, Utc};
use fraudguard_core::{
    Location, Transaction, TransactionAmount, TransactionKind, ValidationError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationPayload {
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

/// Transaction as submitted by a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    #[serde(alias = "transaction_id")]
    pub id: Option<Value>,
    pub amount: Option<Value>,
    pub user_id: Option<Value>,
    pub location: Option<LocationPayload>,
    /// RFC 3339; a naive timestamp is read as UTC. Absent means now.
    pub timestamp: Option<String>,
    pub device_id: Option<String>,
    pub transaction_type: Option<String>,
    pub description: Option<String>,
}

fn required<'a, T>(value: &'a Option<T>, field: &str) -> Result<&'a T, ValidationError> {
    value
        .as_ref()
        .ok_or_else(|| ValidationError::MissingField(field.to_string()))
}

fn as_text(value: &Value, field: &str) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ValidationError::malformed(field, format!("expected a string, got {}", other))),
    }
}

fn as_decimal(value: &Value, field: &str) -> Result<Decimal, ValidationError> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(ValidationError::malformed(field, format!("expected a number, got {}", other)))
        }
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| ValidationError::malformed(field, e))
}

fn as_f64(value: &Value, field: &str) -> Result<f64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| ValidationError::malformed(field, format!("expected a number, got {}", value)))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| ValidationError::malformed("timestamp", e))
}

impl TransactionPayload {
    /// Parse a JSON document into a payload
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::malformed("payload", e))
    }

    /// Validate into a [`Transaction`]. `now` stands in for a missing timestamp.
    pub fn to_transaction(&self, now: DateTime<Utc>) -> Result<Transaction, ValidationError> {
        let id = as_text(required(&self.id, "id")?, "id")?;
        let user_id = as_text(required(&self.user_id, "user_id")?, "user_id")?;

        let amount = as_decimal(required(&self.amount, "amount")?, "amount")?;
        let amount = TransactionAmount::new(amount)?;

        let location = required(&self.location, "location")?;
        let latitude = as_f64(
            required(&location.latitude, "location.latitude")?,
            "location.latitude",
        )?;
        let longitude = as_f64(
            required(&location.longitude, "location.longitude")?,
            "location.longitude",
        )?;
        let location = Location::new(latitude, longitude)?;

        let timestamp = match self.timestamp.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_timestamp(raw)?,
            _ => now,
        };

        let kind = self
            .transaction_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(|t| match TransactionKind::from_str(t) {
                Ok(kind) => kind,
                Err(never) => match never {},
            });

        Ok(Transaction::new(id, amount, user_id, location, timestamp)?
            .with_device_id(self.device_id.clone())
            .with_kind(kind)
            .with_description(self.description.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn full() -> TransactionPayload {
        TransactionPayload::from_json(
            r#"{
                "id": "TX-001",
                "amount": 2000.00,
                "user_id": "USER-001",
                "location": {"latitude": 40.7128, "longitude": -74.0060},
                "timestamp": "2025-03-14T09:30:00Z",
                "device_id": "device-abc",
                "transaction_type": "transfer",
                "description": "rent"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_full_payload() {
        let tx = full().to_transaction(Utc::now()).unwrap();

        assert_eq!(tx.transaction_id(), "TX-001");
        assert_eq!(tx.amount().value(), dec!(2000));
        assert_eq!(tx.user_id(), "USER-001");
        assert_eq!(tx.location().latitude(), 40.7128);
        assert_eq!(tx.timestamp(), Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap());
        assert_eq!(tx.device_id(), Some("device-abc"));
        assert_eq!(tx.kind(), Some(&TransactionKind::Transfer));
        assert_eq!(tx.description(), Some("rent"));
    }

    #[test]
    fn test_transaction_id_alias_and_string_amount() {
        let payload = TransactionPayload::from_json(
            r#"{"transaction_id": "TX-9", "amount": "-12.50", "user_id": "U",
                "location": {"latitude": "1.5", "longitude": 2}}"#,
        )
        .unwrap();
        let now = Utc::now();
        let tx = payload.to_transaction(now).unwrap();

        assert_eq!(tx.transaction_id(), "TX-9");
        assert_eq!(tx.amount().value(), dec!(-12.50));
        assert_eq!(tx.location().latitude(), 1.5);
        assert_eq!(tx.timestamp(), now);
    }

    #[test]
    fn test_missing_fields() {
        let mut payload = full();
        payload.amount = None;
        assert_eq!(
            payload.to_transaction(Utc::now()).unwrap_err(),
            ValidationError::MissingField("amount".to_string())
        );

        let mut payload = full();
        payload.location = Some(LocationPayload {
            latitude: Some(json!(1.0)),
            longitude: None,
        });
        assert_eq!(
            payload.to_transaction(Utc::now()).unwrap_err(),
            ValidationError::MissingField("location.longitude".to_string())
        );
    }

    #[test]
    fn test_malformed_fields() {
        let mut payload = full();
        payload.amount = Some(json!("lots"));
        assert!(matches!(
            payload.to_transaction(Utc::now()),
            Err(ValidationError::MalformedField { ref field, .. }) if field == "amount"
        ));

        let mut payload = full();
        payload.timestamp = Some("yesterday".to_string());
        assert!(matches!(
            payload.to_transaction(Utc::now()),
            Err(ValidationError::MalformedField { ref field, .. }) if field == "timestamp"
        ));

        let mut payload = full();
        payload.user_id = Some(json!({"nested": true}));
        assert!(matches!(
            payload.to_transaction(Utc::now()),
            Err(ValidationError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_domain_rules_apply() {
        let mut payload = full();
        payload.amount = Some(json!(0));
        assert_eq!(
            payload.to_transaction(Utc::now()).unwrap_err(),
            ValidationError::ZeroAmount
        );

        let mut payload = full();
        payload.location = Some(LocationPayload {
            latitude: Some(json!(91.0)),
            longitude: Some(json!(0.0)),
        });
        assert!(matches!(
            payload.to_transaction(Utc::now()),
            Err(ValidationError::LatitudeOutOfRange(_))
        ));

        let mut payload = full();
        payload.id = Some(json!("   "));
        assert_eq!(
            payload.to_transaction(Utc::now()).unwrap_err(),
            ValidationError::BlankField("transaction_id")
        );
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let mut payload = full();
        payload.timestamp = Some("2025-03-14T23:15:00".to_string());
        let tx = payload.to_transaction(Utc::now()).unwrap();
        assert_eq!(tx.timestamp(), Utc.with_ymd_and_hms(2025, 3, 14, 23, 15, 0).unwrap());
    }

    #[test]
    fn test_not_an_object() {
        assert!(TransactionPayload::from_json("[1, 2, 3]").is_err());
    }
}
