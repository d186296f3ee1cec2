//! Velocity (rapid transaction) rule
//!
//! Per user, a sorted set of transaction ids scored by timestamp:
//!
//! 1. record the current transaction
//! 2. prune entries older than the window
//! 3. count what is left, current transaction included
//!
//! The steps are separate store calls, so a concurrent evaluation for the
//! same user may or may not be included in the count depending on how the
//! calls interleave. Tightening it needs an atomic record-and-count in the
//! store.

use async_trait::async_trait;
use fraudguard_core::{RiskLevel, Transaction, ValidationError};
use fraudguard_store::VelocityWindow;
use std::sync::Arc;

use crate::catalog::RuleId;
use crate::config::MAX_TIME_WINDOW_MINUTES;
use crate::fallback::Degrade;
use crate::outcome::RuleOutcome;
use crate::rule::{HistoricalContext, RiskRule};

pub const REASON_RAPID: &str = "rapid_transactions_detected";
pub const REASON_VELOCITY_CHECK_FAILED: &str = "rapid_transaction_check_failed";

pub struct VelocityRule {
    window: Arc<dyn VelocityWindow>,
    max_transactions: u32,
    window_minutes: i64,
}

impl VelocityRule {
    pub fn new(
        window: Arc<dyn VelocityWindow>,
        max_transactions: u32,
        window_minutes: i64,
    ) -> Result<Self, ValidationError> {
        if max_transactions == 0 {
            return Err(ValidationError::NonPositiveParameter("max_transactions"));
        }
        if window_minutes <= 0 {
            return Err(ValidationError::NonPositiveParameter("time_window_minutes"));
        }
        if window_minutes > MAX_TIME_WINDOW_MINUTES {
            return Err(ValidationError::ParameterTooLarge {
                name: "time_window_minutes",
                max: MAX_TIME_WINDOW_MINUTES,
            });
        }
        Ok(Self {
            window,
            max_transactions,
            window_minutes,
        })
    }

    fn degraded() -> RuleOutcome {
        RuleOutcome::flagged(
            RiskLevel::Low,
            REASON_VELOCITY_CHECK_FAILED,
            "Could not check rapid transactions",
        )
    }

    async fn check(&self, transaction: &Transaction) -> Result<RuleOutcome, RuleOutcome> {
        let user_id = transaction.user_id();
        let now_ms = transaction.timestamp().timestamp_millis();
        let window_start = now_ms - self.window_minutes * 60_000;

        self.window
            .record(user_id, transaction.transaction_id(), now_ms)
            .await
            .or_degrade(self.id(), Self::degraded)?;
        self.window
            .prune_before(user_id, window_start)
            .await
            .or_degrade(self.id(), Self::degraded)?;
        let count = self
            .window
            .count_between(user_id, window_start, now_ms)
            .await
            .or_degrade(self.id(), Self::degraded)?;

        if count > u64::from(self.max_transactions) {
            return Ok(RuleOutcome::flagged(
                RiskLevel::High,
                REASON_RAPID,
                format!(
                    "{} transactions in {} minutes (limit: {})",
                    count, self.window_minutes, self.max_transactions
                ),
            ));
        }

        Ok(RuleOutcome::pass_with(format!(
            "{} transactions in {} minutes",
            count, self.window_minutes
        )))
    }
}

#[async_trait]
impl RiskRule for VelocityRule {
    fn id(&self) -> RuleId {
        RuleId::RapidTransaction
    }

    async fn evaluate(&self, transaction: &Transaction, _: &HistoricalContext) -> RuleOutcome {
        self.check(transaction)
            .await
            .unwrap_or_else(|degraded| degraded)
    }
}
