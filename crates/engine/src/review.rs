//! Analyst review of an evaluation

use chrono::Utc;
use fraudguard_core::{Evaluation, ReviewDecision, ValidationError};
use fraudguard_store::EvaluationRepository;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};

pub struct ReviewTransaction {
    evaluations: Arc<dyn EvaluationRepository>,
}

impl ReviewTransaction {
    pub fn new(evaluations: Arc<dyn EvaluationRepository>) -> Self {
        Self { evaluations }
    }

    /// Apply `decision` ("APPROVED" or "REJECTED") on behalf of `analyst_id`
    /// and return the updated record.
    pub async fn execute(
        &self,
        transaction_id: &str,
        decision: &str,
        analyst_id: &str,
    ) -> EngineResult<Evaluation> {
        let decision = ReviewDecision::from_str(decision)?;
        if analyst_id.trim().is_empty() {
            return Err(ValidationError::BlankField("analyst_id").into());
        }

        let mut evaluation = self
            .evaluations
            .get_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(transaction_id.to_string()))?;

        let previous = evaluation.apply_review(decision, analyst_id, Utc::now())?;
        if previous.is_terminal() {
            warn!(
                transaction_id,
                previous = %previous,
                decision = %decision.as_status(),
                "Overwriting decision on a terminal evaluation"
            );
        }

        self.evaluations.update(&evaluation).await?;

        info!(
            transaction_id,
            analyst_id,
            decision = %decision.as_status(),
            "Transaction reviewed"
        );
        Ok(evaluation)
    }
}
