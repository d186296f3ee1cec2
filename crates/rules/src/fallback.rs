//! Store-failure fallback
//!
//! Rules that talk to a store must never fail the evaluation. Every store
//! call goes through [`Degrade::or_degrade`], which turns an error into the
//! rule's own LOW verdict. Rules then short-circuit with `?` and unwrap the
//! two arms at the top:
//!
//! ```ignore
//! async fn evaluate(&self, tx: &Transaction, _: &HistoricalContext) -> RuleOutcome {
//!     self.check(tx).await.unwrap_or_else(|degraded| degraded)
//! }
//! ```

use fraudguard_store::StoreResult;
use tracing::warn;

use crate::catalog::RuleId;
use crate::outcome::RuleOutcome;

pub trait Degrade<T> {
    /// Map a store failure to `fallback()`, logging the error
    fn or_degrade<F>(self, rule: RuleId, fallback: F) -> Result<T, RuleOutcome>
    where
        F: FnOnce() -> RuleOutcome;
}

impl<T> Degrade<T> for StoreResult<T> {
    fn or_degrade<F>(self, rule: RuleId, fallback: F) -> Result<T, RuleOutcome>
    where
        F: FnOnce() -> RuleOutcome,
    {
        self.map_err(|error| {
            let outcome = fallback();
            warn!(
                rule = %rule,
                error = %error,
                risk_level = %outcome.risk_level,
                "Store call failed, rule degraded"
            );
            outcome
        })
    }
}
