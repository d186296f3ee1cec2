//! Storage contracts
//!
//! Every contract is keyed by user id or transaction id, so evaluations for
//! different transactions share no in-process state.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fraudguard_core::{Evaluation, Location, RiskLevel, TransactionStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::StoreResult;

/// Persisted evaluation records
#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    /// Insert a record. A record with the same transaction id is replaced.
    async fn save(&self, evaluation: &Evaluation) -> StoreResult<()>;

    async fn get_by_transaction_id(&self, transaction_id: &str)
        -> StoreResult<Option<Evaluation>>;

    /// All records, newest first
    async fn get_all(&self) -> StoreResult<Vec<Evaluation>>;

    /// Records of one user, newest first
    async fn get_by_user(&self, user_id: &str) -> StoreResult<Vec<Evaluation>>;

    /// Overwrite an existing record. Fails with `NotFound` if absent.
    async fn update(&self, evaluation: &Evaluation) -> StoreResult<()>;
}

/// Read access to past evaluation times
#[async_trait]
pub trait EvaluationHistory: Send + Sync {
    /// Creation timestamps (RFC 3339, as stored) of a user's evaluations
    /// created at or after `since`, newest first, at most `limit` of them.
    async fn creation_times(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<String>>;
}

/// Last known location per user
#[async_trait]
pub trait LocationCache: Send + Sync {
    async fn get_user_location(&self, user_id: &str) -> StoreResult<Option<Location>>;

    async fn set_user_location(
        &self,
        user_id: &str,
        location: Location,
        ttl: Duration,
    ) -> StoreResult<()>;
}

/// Threshold overrides stored next to the caches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub amount_threshold: Decimal,
    pub location_radius_km: f64,
}

/// Runtime configuration shared by all evaluator instances
#[async_trait]
pub trait ConfigCache: Send + Sync {
    async fn get_threshold_config(&self) -> StoreResult<Option<ThresholdConfig>>;

    async fn set_threshold_config(&self, config: &ThresholdConfig) -> StoreResult<()>;

    /// Ids of rules switched off by an operator
    async fn disabled_rules(&self) -> StoreResult<BTreeSet<String>>;

    async fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> StoreResult<()>;
}

/// Per-user set of seen device ids, each with its own expiry
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn is_known(&self, user_id: &str, device_id: &str) -> StoreResult<bool>;

    async fn register(&self, user_id: &str, device_id: &str, ttl: Duration) -> StoreResult<()>;
}

/// Per-user sorted set of recent transactions, scored by epoch millis.
///
/// The three calls are deliberately separate: two concurrent evaluations for
/// the same user may interleave between them.
#[async_trait]
pub trait VelocityWindow: Send + Sync {
    /// Insert or re-score `member`
    async fn record(&self, user_id: &str, member: &str, score_ms: i64) -> StoreResult<()>;

    /// Drop members scored strictly below `min_score_ms`; returns how many
    async fn prune_before(&self, user_id: &str, min_score_ms: i64) -> StoreResult<u64>;

    /// Count members with `min_ms <= score <= max_ms`
    async fn count_between(&self, user_id: &str, min_ms: i64, max_ms: i64) -> StoreResult<u64>;
}

/// Message sent to analysts for every evaluation that needs a human
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub transaction_id: String,
    pub user_id: String,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    pub amount: Option<Decimal>,
    pub status: TransactionStatus,
    pub evaluated_at: DateTime<Utc>,
}

impl From<&Evaluation> for ReviewSummary {
    fn from(evaluation: &Evaluation) -> Self {
        Self {
            transaction_id: evaluation.transaction_id.clone(),
            user_id: evaluation.user_id.clone(),
            risk_level: evaluation.risk_level,
            reasons: evaluation.reasons.clone(),
            amount: evaluation.amount,
            status: evaluation.status,
            evaluated_at: evaluation.created_at,
        }
    }
}

/// Manual review dispatch. Delivery is fire-and-forget for the caller.
#[async_trait]
pub trait ReviewPublisher: Send + Sync {
    fn name(&self) -> &str;

    async fn publish_for_manual_review(&self, summary: &ReviewSummary) -> StoreResult<()>;
}
