//! Location deviation rule

use async_trait::async_trait;
use fraudguard_core::{geo, RiskLevel, Transaction, ValidationError};

use crate::catalog::RuleId;
use crate::outcome::RuleOutcome;
use crate::rule::{HistoricalContext, RiskRule};

pub const REASON_NO_HISTORY: &str = "no_historical_location";
pub const REASON_UNUSUAL_LOCATION: &str = "unusual_location";

/// HIGH when the transaction is farther than `radius_km` from the user's
/// last known location. Users with no known location are never flagged.
pub struct LocationDeviationRule {
    radius_km: f64,
}

impl LocationDeviationRule {
    pub fn new(radius_km: f64) -> Result<Self, ValidationError> {
        if radius_km.is_nan() || radius_km <= 0.0 {
            return Err(ValidationError::NonPositiveParameter("location_radius_km"));
        }
        Ok(Self { radius_km })
    }
}

#[async_trait]
impl RiskRule for LocationDeviationRule {
    fn id(&self) -> RuleId {
        RuleId::LocationCheck
    }

    async fn evaluate(&self, transaction: &Transaction, context: &HistoricalContext) -> RuleOutcome {
        let Some(previous) = context.last_location else {
            return RuleOutcome::flagged(
                RiskLevel::Low,
                REASON_NO_HISTORY,
                "First transaction for user, no historical location",
            );
        };

        let current = transaction.location();
        let distance_km = geo::haversine_km(&previous, &current);

        if distance_km > self.radius_km {
            return RuleOutcome::flagged(
                RiskLevel::High,
                REASON_UNUSUAL_LOCATION,
                format!(
                    "distance: {:.2} km exceeds radius: {} km. Previous: {}, Current: {}",
                    distance_km, self.radius_km, previous, current
                ),
            );
        }

        RuleOutcome::pass()
    }
}
