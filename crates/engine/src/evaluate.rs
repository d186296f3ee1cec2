//! Evaluate a transaction
//!
//! ```text
//! 1. payload ──► Transaction                (ValidationError aborts here)
//! 2. last location from cache               (any failure = no history)
//! 3. rule set for this request ──► pipeline
//! 4. Evaluation, status seeded from risk
//! 5. save                                   (failure aborts)
//! 6. cache current location                 (failure logged)
//! 7. MEDIUM/HIGH ──► review queue           (failure logged)
//! ```

use chrono::Utc;
use fraudguard_core::{Evaluation, Location, RiskLevel, Transaction, TransactionStatus};
use fraudguard_rules::{
    build_rule_set, HistoricalContext, RuleConfig, RuleDeps, RuleId, RulePipeline,
};
use fraudguard_store::{
    ConfigCache, DeviceRegistry, EvaluationHistory, EvaluationRepository, InMemoryCache,
    InMemoryEvaluationRepository, LocationCache, ReviewPublisher, ReviewSummary, VelocityWindow,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::payload::TransactionPayload;

/// What the caller gets back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub transaction_id: String,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    pub status: TransactionStatus,
}

impl From<&Evaluation> for EvaluationResult {
    fn from(evaluation: &Evaluation) -> Self {
        Self {
            transaction_id: evaluation.transaction_id.clone(),
            risk_level: evaluation.risk_level,
            reasons: evaluation.reasons.clone(),
            status: evaluation.status,
        }
    }
}

/// Every collaborator the evaluator touches
#[derive(Clone)]
pub struct EvaluatorStores {
    pub evaluations: Arc<dyn EvaluationRepository>,
    pub history: Arc<dyn EvaluationHistory>,
    pub locations: Arc<dyn LocationCache>,
    pub config: Arc<dyn ConfigCache>,
    pub devices: Arc<dyn DeviceRegistry>,
    pub velocity: Arc<dyn VelocityWindow>,
    pub publisher: Arc<dyn ReviewPublisher>,
}

impl EvaluatorStores {
    /// Process-local stores around the given publisher
    pub fn in_memory(publisher: Arc<dyn ReviewPublisher>) -> Self {
        let evaluations = Arc::new(InMemoryEvaluationRepository::new());
        let cache = Arc::new(InMemoryCache::new());
        Self {
            evaluations: evaluations.clone(),
            history: evaluations,
            locations: cache.clone(),
            config: cache.clone(),
            devices: cache.clone(),
            velocity: cache,
            publisher,
        }
    }

    fn rule_deps(&self) -> RuleDeps {
        RuleDeps {
            devices: self.devices.clone(),
            velocity: self.velocity.clone(),
            history: self.history.clone(),
        }
    }
}

pub struct EvaluateTransaction {
    stores: EvaluatorStores,
    config: EngineConfig,
}

impl EvaluateTransaction {
    /// Fails if the static configuration holds a non-positive parameter
    pub fn new(stores: EvaluatorStores, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { stores, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate the payload, then evaluate it
    pub async fn execute(&self, payload: &TransactionPayload) -> EngineResult<EvaluationResult> {
        let transaction = payload.to_transaction(Utc::now())?;
        self.evaluate(&transaction).await
    }

    /// Evaluate an already validated transaction
    pub async fn evaluate(&self, transaction: &Transaction) -> EngineResult<EvaluationResult> {
        let user_id = transaction.user_id();
        let context = HistoricalContext::with_last_location(self.last_location(user_id).await);

        let rule_config = self.resolve_rule_config().await;
        let enabled = self.resolve_enabled_rules().await;
        let rules = build_rule_set(&enabled, &rule_config, &self.stores.rule_deps())?;
        let verdict = RulePipeline::new(rules).run(transaction, &context).await;

        let evaluation = Evaluation::new(transaction, verdict.risk_level, verdict.reasons, Utc::now());
        self.stores.evaluations.save(&evaluation).await?;

        if let Err(error) = self
            .stores
            .locations
            .set_user_location(user_id, transaction.location(), self.config.location_ttl())
            .await
        {
            warn!(user_id, error = %error, "Failed to cache user location");
        }

        if evaluation.requires_review() {
            let summary = ReviewSummary::from(&evaluation);
            match self.stores.publisher.publish_for_manual_review(&summary).await {
                Ok(()) => debug!(
                    transaction_id = %evaluation.transaction_id,
                    publisher = self.stores.publisher.name(),
                    "Dispatched for manual review"
                ),
                Err(error) => warn!(
                    transaction_id = %evaluation.transaction_id,
                    error = %error,
                    "Failed to dispatch for manual review"
                ),
            }
        }

        info!(
            transaction_id = %evaluation.transaction_id,
            user_id,
            risk_level = %evaluation.risk_level,
            status = %evaluation.status,
            reasons = ?evaluation.reasons,
            "Transaction evaluated"
        );

        Ok(EvaluationResult::from(&evaluation))
    }

    async fn last_location(&self, user_id: &str) -> Option<Location> {
        match self.stores.locations.get_user_location(user_id).await {
            Ok(location) => location,
            Err(error) => {
                warn!(user_id, error = %error, "Unreadable cached location, treating as no history");
                None
            }
        }
    }

    /// Static rule parameters with the cached threshold overrides on top
    async fn resolve_rule_config(&self) -> RuleConfig {
        let base = &self.config.rules;
        match self.stores.config.get_threshold_config().await {
            Ok(Some(thresholds)) => {
                let overlaid = base.with_thresholds(&thresholds);
                match overlaid.validate() {
                    Ok(()) => overlaid,
                    Err(error) => {
                        warn!(error = %error, "Ignoring invalid cached thresholds");
                        base.clone()
                    }
                }
            }
            Ok(None) => base.clone(),
            Err(error) => {
                warn!(error = %error, "Threshold config unavailable, using static config");
                base.clone()
            }
        }
    }

    async fn resolve_enabled_rules(&self) -> Vec<RuleId> {
        let disabled = match self.stores.config.disabled_rules().await {
            Ok(disabled) => disabled,
            Err(error) => {
                warn!(error = %error, "Disabled rules unavailable, running all configured rules");
                BTreeSet::new()
            }
        };

        self.config
            .enabled_rules
            .iter()
            .filter(|id| !disabled.contains(id.as_str()))
            .copied()
            .collect()
    }
}
