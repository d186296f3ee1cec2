//! Risk rule trait

use async_trait::async_trait;
use fraudguard_core::{Location, Transaction};

use crate::catalog::RuleId;
use crate::outcome::RuleOutcome;

/// Context resolved by the evaluator before any rule runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalContext {
    /// Last location the user transacted from, if still cached
    pub last_location: Option<Location>,
}

impl HistoricalContext {
    pub fn with_last_location(location: Option<Location>) -> Self {
        Self {
            last_location: location,
        }
    }
}

/// One independent fraud check.
///
/// `evaluate` is infallible: rules backed by a store degrade to a LOW
/// verdict on failure instead of returning an error.
#[async_trait]
pub trait RiskRule: Send + Sync {
    fn id(&self) -> RuleId;

    /// Rule name for logging
    fn name(&self) -> &'static str {
        self.id().as_str()
    }

    async fn evaluate(&self, transaction: &Transaction, context: &HistoricalContext)
        -> RuleOutcome;
}
