//! Rule catalogue and rule-set assembly
//!
//! The pipeline does not know which rules exist. [`build_rule_set`] turns
//! a set of enabled ids plus a [`RuleConfig`] into the ordered rule list,
//! always in catalogue order.

use fraudguard_core::ValidationError;
use fraudguard_store::{DeviceRegistry, EvaluationHistory, VelocityWindow};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::amount::AmountThresholdRule;
use crate::config::RuleConfig;
use crate::device::DeviceRecognitionRule;
use crate::location::LocationDeviationRule;
use crate::rule::RiskRule;
use crate::unusual_time::UnusualTimeRule;
use crate::velocity::VelocityRule;

/// Stable rule identifiers, declared in evaluation order
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum RuleId {
    #[serde(rename = "rule_amount_threshold")]
    #[strum(serialize = "rule_amount_threshold")]
    AmountThreshold,

    #[serde(rename = "rule_location_check")]
    #[strum(serialize = "rule_location_check")]
    LocationCheck,

    #[serde(rename = "rule_device_validation")]
    #[strum(serialize = "rule_device_validation")]
    DeviceValidation,

    #[serde(rename = "rule_rapid_transaction")]
    #[strum(serialize = "rule_rapid_transaction")]
    RapidTransaction,

    #[serde(rename = "rule_unusual_time")]
    #[strum(serialize = "rule_unusual_time")]
    UnusualTime,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Every rule, in catalogue order
    pub fn all() -> Vec<RuleId> {
        RuleId::iter().collect()
    }
}

/// Stores the stateful rules read and write
#[derive(Clone)]
pub struct RuleDeps {
    pub devices: Arc<dyn DeviceRegistry>,
    pub velocity: Arc<dyn VelocityWindow>,
    pub history: Arc<dyn EvaluationHistory>,
}

/// Build the ordered rule list for one evaluation.
///
/// Ids not in `enabled` are skipped; duplicates and input order are
/// ignored. Fails only if `config` holds a non-positive parameter.
pub fn build_rule_set(
    enabled: &[RuleId],
    config: &RuleConfig,
    deps: &RuleDeps,
) -> Result<Vec<Arc<dyn RiskRule>>, ValidationError> {
    config.validate()?;

    let mut rules: Vec<Arc<dyn RiskRule>> = Vec::with_capacity(enabled.len());
    for id in RuleId::iter().filter(|id| enabled.contains(id)) {
        let rule: Arc<dyn RiskRule> = match id {
            RuleId::AmountThreshold => Arc::new(AmountThresholdRule::new(config.amount_threshold)?),
            RuleId::LocationCheck => {
                Arc::new(LocationDeviationRule::new(config.location_radius_km)?)
            }
            RuleId::DeviceValidation => Arc::new(DeviceRecognitionRule::new(
                deps.devices.clone(),
                config.device_memory(),
            )),
            RuleId::RapidTransaction => Arc::new(VelocityRule::new(
                deps.velocity.clone(),
                config.max_transactions,
                config.time_window_minutes,
            )?),
            RuleId::UnusualTime => Arc::new(UnusualTimeRule::new(
                deps.history.clone(),
                config.min_history,
                config.deviation_threshold_hours,
                config.history_lookback(),
                config.history_limit,
            )?),
        };
        rules.push(rule);
    }

    Ok(rules)
}
