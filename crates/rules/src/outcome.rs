//! Per-rule verdict

use fraudguard_core::RiskLevel;
use serde::{Deserialize, Serialize};

/// What a single rule concluded about a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub risk_level: RiskLevel,
    /// Reason codes; empty when the rule passed silently
    pub reasons: Vec<String>,
    /// Human-readable explanation, may be empty
    pub detail: String,
}

impl RuleOutcome {
    /// LOW with no reasons
    pub fn pass() -> Self {
        Self {
            risk_level: RiskLevel::Low,
            reasons: Vec::new(),
            detail: String::new(),
        }
    }

    /// LOW with no reasons and an explanation
    pub fn pass_with(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            ..Self::pass()
        }
    }

    /// A verdict carrying one reason code
    pub fn flagged(risk_level: RiskLevel, reason: &str, detail: impl Into<String>) -> Self {
        Self {
            risk_level,
            reasons: vec![reason.to_string()],
            detail: detail.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.risk_level == RiskLevel::Low && self.reasons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass() {
        let outcome = RuleOutcome::pass();
        assert!(outcome.is_pass());
        assert!(outcome.detail.is_empty());
    }

    #[test]
    fn test_informational_low_is_not_a_pass() {
        let outcome = RuleOutcome::flagged(RiskLevel::Low, "no_historical_location", "first");
        assert!(!outcome.is_pass());
        assert_eq!(outcome.reasons, vec!["no_historical_location"]);
    }
}
