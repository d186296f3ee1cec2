//! Amount threshold rule

use async_trait::async_trait;
use fraudguard_core::{RiskLevel, Transaction, ValidationError};
use rust_decimal::Decimal;

use crate::catalog::RuleId;
use crate::outcome::RuleOutcome;
use crate::rule::{HistoricalContext, RiskRule};

pub const REASON_AMOUNT_EXCEEDED: &str = "amount_threshold_exceeded";

/// HIGH when `|amount|` is strictly above the threshold. Stateless.
pub struct AmountThresholdRule {
    threshold: Decimal,
}

impl AmountThresholdRule {
    pub fn new(threshold: Decimal) -> Result<Self, ValidationError> {
        if threshold <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveParameter("amount_threshold"));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }
}

#[async_trait]
impl RiskRule for AmountThresholdRule {
    fn id(&self) -> RuleId {
        RuleId::AmountThreshold
    }

    async fn evaluate(&self, transaction: &Transaction, _: &HistoricalContext) -> RuleOutcome {
        let magnitude = transaction.amount().magnitude();
        if magnitude > self.threshold {
            return RuleOutcome::flagged(
                RiskLevel::High,
                REASON_AMOUNT_EXCEEDED,
                format!("amount: {} exceeds threshold: {}", magnitude, self.threshold),
            );
        }
        RuleOutcome::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fraudguard_core::{Location, TransactionAmount};
    use rust_decimal_macros::dec;

    fn tx(amount: Decimal) -> Transaction {
        Transaction::new(
            "TX-1",
            TransactionAmount::new(amount).unwrap(),
            "U-1",
            Location::new(0.0, 0.0).unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_above_threshold_is_high() {
        let rule = AmountThresholdRule::new(dec!(1500.00)).unwrap();
        let outcome = rule.evaluate(&tx(dec!(2000.00)), &HistoricalContext::default()).await;

        assert_eq!(outcome.risk_level, RiskLevel::High);
        assert_eq!(outcome.reasons, vec![REASON_AMOUNT_EXCEEDED]);
        assert!(outcome.detail.contains("2000.00"));
    }

    #[tokio::test]
    async fn test_negative_amount_uses_magnitude() {
        let rule = AmountThresholdRule::new(dec!(1500.00)).unwrap();
        let outcome = rule.evaluate(&tx(dec!(-1500.01)), &HistoricalContext::default()).await;
        assert_eq!(outcome.risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_boundary_is_low() {
        let rule = AmountThresholdRule::new(dec!(1500.00)).unwrap();
        for amount in [dec!(1500.00), dec!(-1500), dec!(100.00)] {
            let outcome = rule.evaluate(&tx(amount), &HistoricalContext::default()).await;
            assert!(outcome.is_pass(), "{} should pass", amount);
        }
    }

    #[test]
    fn test_non_positive_threshold_rejected() {
        assert!(AmountThresholdRule::new(dec!(0)).is_err());
        assert!(AmountThresholdRule::new(dec!(-1)).is_err());
    }
}
