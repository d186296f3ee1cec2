//! Rule pipeline - runs an ordered rule list and aggregates
//!
//! Rules run one after another, in list order. Reason codes are
//! concatenated in that order and the aggregate risk level is the most
//! severe rule level. A rule that degraded on a store failure contributes
//! its LOW verdict like any other.

use fraudguard_core::{RiskLevel, Transaction};
use std::sync::Arc;
use tracing::debug;

use crate::catalog::RuleId;
use crate::outcome::RuleOutcome;
use crate::rule::{HistoricalContext, RiskRule};

/// One rule's contribution to a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RuleVerdict {
    pub rule: RuleId,
    pub outcome: RuleOutcome,
}

/// Aggregated result of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineVerdict {
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    pub verdicts: Vec<RuleVerdict>,
}

impl PipelineVerdict {
    /// Aggregate per-rule verdicts: max severity, reasons in order
    pub fn aggregate(verdicts: Vec<RuleVerdict>) -> Self {
        let risk_level = RiskLevel::aggregate(verdicts.iter().map(|v| v.outcome.risk_level));
        let reasons = verdicts
            .iter()
            .flat_map(|v| v.outcome.reasons.iter().cloned())
            .collect();

        Self {
            risk_level,
            reasons,
            verdicts,
        }
    }
}

/// Interpreter over whatever rule list it is given
#[derive(Default)]
pub struct RulePipeline {
    rules: Vec<Arc<dyn RiskRule>>,
}

impl RulePipeline {
    pub fn new(rules: Vec<Arc<dyn RiskRule>>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule ids in evaluation order
    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub async fn run(&self, transaction: &Transaction, context: &HistoricalContext) -> PipelineVerdict {
        let mut verdicts = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let outcome = rule.evaluate(transaction, context).await;
            debug!(
                transaction_id = transaction.transaction_id(),
                rule = rule.name(),
                risk_level = %outcome.risk_level,
                reasons = ?outcome.reasons,
                "Rule evaluated"
            );
            verdicts.push(RuleVerdict {
                rule: rule.id(),
                outcome,
            });
        }

        PipelineVerdict::aggregate(verdicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use fraudguard_core::{Location, TransactionAmount};
    use rust_decimal_macros::dec;

    /// Rule that always answers the same outcome
    struct Fixed(RuleId, RuleOutcome);

    #[async_trait]
    impl RiskRule for Fixed {
        fn id(&self) -> RuleId {
            self.0
        }

        async fn evaluate(&self, _: &Transaction, _: &HistoricalContext) -> RuleOutcome {
            self.1.clone()
        }
    }

    fn fixed(id: RuleId, level: RiskLevel, reason: Option<&str>) -> Arc<dyn RiskRule> {
        let outcome = match reason {
            Some(r) => RuleOutcome::flagged(level, r, ""),
            None => RuleOutcome::pass(),
        };
        Arc::new(Fixed(id, outcome))
    }

    fn tx() -> Transaction {
        Transaction::new(
            "TX-1",
            TransactionAmount::new(dec!(-10)).unwrap(),
            "U-1",
            Location::new(0.0, 0.0).unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_max_severity_and_reason_order() {
        let pipeline = RulePipeline::new(vec![
            fixed(RuleId::AmountThreshold, RiskLevel::High, Some("amount_threshold_exceeded")),
            fixed(RuleId::LocationCheck, RiskLevel::Low, Some("no_historical_location")),
            fixed(RuleId::DeviceValidation, RiskLevel::Medium, Some("no_device_id")),
            fixed(RuleId::RapidTransaction, RiskLevel::Low, None),
        ]);

        let verdict = pipeline.run(&tx(), &HistoricalContext::default()).await;

        assert_eq!(verdict.risk_level, RiskLevel::High);
        assert_eq!(
            verdict.reasons,
            vec!["amount_threshold_exceeded", "no_historical_location", "no_device_id"]
        );
        assert_eq!(verdict.verdicts.len(), 4);
    }

    #[tokio::test]
    async fn test_many_mediums_do_not_escalate() {
        let pipeline = RulePipeline::new(vec![
            fixed(RuleId::DeviceValidation, RiskLevel::Medium, Some("no_device_id")),
            fixed(RuleId::UnusualTime, RiskLevel::Medium, Some("moderately_unusual_time")),
        ]);

        let verdict = pipeline.run(&tx(), &HistoricalContext::default()).await;
        assert_eq!(verdict.risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_empty_pipeline_is_low() {
        let verdict = RulePipeline::default()
            .run(&tx(), &HistoricalContext::default())
            .await;
        assert_eq!(verdict.risk_level, RiskLevel::Low);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn test_rule_ids() {
        let pipeline = RulePipeline::new(vec![
            fixed(RuleId::UnusualTime, RiskLevel::Low, None),
            fixed(RuleId::AmountThreshold, RiskLevel::Low, None),
        ]);
        assert_eq!(pipeline.rule_ids(), vec![RuleId::UnusualTime, RuleId::AmountThreshold]);
        assert_eq!(pipeline.len(), 2);
    }
}
