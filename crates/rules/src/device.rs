//! Device recognition rule

use async_trait::async_trait;
use chrono::Duration;
use fraudguard_core::{RiskLevel, Transaction};
use fraudguard_store::DeviceRegistry;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::RuleId;
use crate::fallback::Degrade;
use crate::outcome::RuleOutcome;
use crate::rule::{HistoricalContext, RiskRule};

pub const REASON_NO_DEVICE: &str = "no_device_id";
pub const REASON_UNKNOWN_DEVICE: &str = "unknown_device";
pub const REASON_DEVICE_CHECK_FAILED: &str = "device_validation_failed";

/// Checks the device id against the user's seen-device set.
///
/// An unknown device is HIGH and becomes known from then on. A missing
/// device id is MEDIUM and registers nothing. A failed lookup or a failed
/// registration is LOW.
pub struct DeviceRecognitionRule {
    devices: Arc<dyn DeviceRegistry>,
    memory: Duration,
}

impl DeviceRecognitionRule {
    pub fn new(devices: Arc<dyn DeviceRegistry>, memory: Duration) -> Self {
        Self { devices, memory }
    }

    fn degraded() -> RuleOutcome {
        RuleOutcome::flagged(
            RiskLevel::Low,
            REASON_DEVICE_CHECK_FAILED,
            "Could not validate device",
        )
    }

    async fn check(&self, transaction: &Transaction) -> Result<RuleOutcome, RuleOutcome> {
        let Some(device_id) = transaction.device_id() else {
            return Ok(RuleOutcome::flagged(
                RiskLevel::Medium,
                REASON_NO_DEVICE,
                "Transaction has no device ID",
            ));
        };
        let user_id = transaction.user_id();

        let known = self
            .devices
            .is_known(user_id, device_id)
            .await
            .or_degrade(self.id(), Self::degraded)?;

        if known {
            return Ok(RuleOutcome::pass());
        }

        self.devices
            .register(user_id, device_id, self.memory)
            .await
            .or_degrade(self.id(), Self::degraded)?;
        debug!(user_id, device_id, "Registered new device");

        Ok(RuleOutcome::flagged(
            RiskLevel::High,
            REASON_UNKNOWN_DEVICE,
            format!("Device ID {} is not registered", device_id),
        ))
    }
}

#[async_trait]
impl RiskRule for DeviceRecognitionRule {
    fn id(&self) -> RuleId {
        RuleId::DeviceValidation
    }

    async fn evaluate(&self, transaction: &Transaction, _: &HistoricalContext) -> RuleOutcome {
        self.check(transaction)
            .await
            .unwrap_or_else(|degraded| degraded)
    }
}
