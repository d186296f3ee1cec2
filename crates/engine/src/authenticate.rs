//! User confirmation of a pending transaction

use chrono::Utc;
use fraudguard_core::Evaluation;
use fraudguard_store::EvaluationRepository;
use std::sync::Arc;
use tracing::info;

use crate::error::{EngineError, EngineResult};

pub struct AuthenticateTransaction {
    evaluations: Arc<dyn EvaluationRepository>,
}

impl AuthenticateTransaction {
    pub fn new(evaluations: Arc<dyn EvaluationRepository>) -> Self {
        Self { evaluations }
    }

    /// Record whether the user confirmed the transaction. Only allowed
    /// while the evaluation is pending review; the status is not changed.
    pub async fn execute(&self, transaction_id: &str, confirmed: bool) -> EngineResult<Evaluation> {
        let mut evaluation = self
            .evaluations
            .get_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(transaction_id.to_string()))?;

        evaluation.authenticate_by_user(confirmed, Utc::now())?;
        self.evaluations.update(&evaluation).await?;

        info!(transaction_id, confirmed, "User authentication recorded");
        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::{
        LifecycleError, Location, RiskLevel, Transaction, TransactionAmount, TransactionStatus,
    };
    use fraudguard_store::InMemoryEvaluationRepository;
    use rust_decimal_macros::dec;

    async fn seeded(level: RiskLevel) -> (AuthenticateTransaction, Arc<InMemoryEvaluationRepository>) {
        let repo = Arc::new(InMemoryEvaluationRepository::new());
        let tx = Transaction::new(
            "TX-001",
            TransactionAmount::new(dec!(-250)).unwrap(),
            "USER-001",
            Location::new(48.8566, 2.3522).unwrap(),
            Utc::now(),
        )
        .unwrap();
        repo.save(&Evaluation::new(&tx, level, vec![], Utc::now()))
            .await
            .unwrap();
        (AuthenticateTransaction::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_confirm_pending() {
        let (auth, repo) = seeded(RiskLevel::Medium).await;

        let updated = auth.execute("TX-001", true).await.unwrap();
        assert_eq!(updated.user_authenticated, Some(true));
        assert!(updated.user_authenticated_at.is_some());
        assert_eq!(updated.status, TransactionStatus::PendingReview);

        let stored = repo.get_by_transaction_id("TX-001").await.unwrap().unwrap();
        assert_eq!(stored.user_authenticated, Some(true));
    }

    #[tokio::test]
    async fn test_last_answer_wins() {
        let (auth, _) = seeded(RiskLevel::Medium).await;
        auth.execute("TX-001", true).await.unwrap();
        let updated = auth.execute("TX-001", false).await.unwrap();
        assert_eq!(updated.user_authenticated, Some(false));
    }

    #[tokio::test]
    async fn test_not_pending() {
        for level in [RiskLevel::Low, RiskLevel::High] {
            let (auth, repo) = seeded(level).await;
            let err = auth.execute("TX-001", true).await.unwrap_err();
            assert!(matches!(
                err,
                EngineError::State(LifecycleError::NotPendingReview { .. })
            ));

            let stored = repo.get_by_transaction_id("TX-001").await.unwrap().unwrap();
            assert_eq!(stored.user_authenticated, None);
        }
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let (auth, _) = seeded(RiskLevel::Medium).await;
        assert!(auth.execute("TX-404", true).await.unwrap_err().is_not_found());
    }
}
