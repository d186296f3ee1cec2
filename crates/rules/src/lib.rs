//! # FraudGuard Rules
//!
//! Five independent risk rules behind one [`RiskRule`] trait, the
//! store-failure fallback they share, and the [`RulePipeline`] that runs
//! an ordered rule list and keeps the most severe verdict.
//!
//! Which rules run, and with which parameters, is decided outside the
//! pipeline by [`build_rule_set`].

pub mod amount;
pub mod catalog;
pub mod config;
pub mod device;
pub mod fallback;
pub mod location;
pub mod outcome;
pub mod pipeline;
pub mod rule;
pub mod unusual_time;
pub mod velocity;

pub use amount::AmountThresholdRule;
pub use catalog::{build_rule_set, RuleDeps, RuleId};
pub use config::{
    RuleConfig, MAX_DEVIATION_THRESHOLD_HOURS, MAX_RETENTION_DAYS, MAX_TIME_WINDOW_MINUTES,
};
pub use device::DeviceRecognitionRule;
pub use fallback::Degrade;
pub use location::LocationDeviationRule;
pub use outcome::RuleOutcome;
pub use pipeline::{PipelineVerdict, RulePipeline, RuleVerdict};
pub use rule::{HistoricalContext, RiskRule};
pub use unusual_time::UnusualTimeRule;
pub use velocity::VelocityRule;
