//! Rule parameters
//!
//! Every parameter has a serde default so a partial JSON file is enough.
//! Threshold overrides from the config cache are laid over the file values
//! once per evaluation request.

use chrono::Duration;
use fraudguard_core::ValidationError;
use fraudguard_store::ThresholdConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Longest retention or lookback accepted, in days (about ten years)
pub const MAX_RETENTION_DAYS: i64 = 3650;

/// Longest velocity window accepted, in minutes
pub const MAX_TIME_WINDOW_MINUTES: i64 = 24 * 60;

/// Two hours of the day are never more than 12 hours apart
pub const MAX_DEVIATION_THRESHOLD_HOURS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    // === Amount ===
    /// Absolute amount above which a transaction is HIGH risk
    #[serde(default = "default_amount_threshold")]
    pub amount_threshold: Decimal,

    // === Location ===
    /// Distance from the last known location that counts as unusual
    #[serde(default = "default_location_radius_km")]
    pub location_radius_km: f64,

    // === Device ===
    /// How long a first-seen device stays known
    #[serde(default = "default_device_memory_days")]
    pub device_memory_days: i64,

    // === Velocity ===
    #[serde(default = "default_max_transactions")]
    pub max_transactions: u32,

    #[serde(default = "default_time_window_minutes")]
    pub time_window_minutes: i64,

    // === Unusual time ===
    /// Minimum past evaluations before an hourly pattern is trusted
    #[serde(default = "default_min_history")]
    pub min_history: usize,

    #[serde(default = "default_deviation_threshold_hours")]
    pub deviation_threshold_hours: u32,

    #[serde(default = "default_history_lookback_days")]
    pub history_lookback_days: i64,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_amount_threshold() -> Decimal {
    Decimal::new(150_000, 2)
}

fn default_location_radius_km() -> f64 {
    100.0
}

fn default_device_memory_days() -> i64 {
    90
}

fn default_max_transactions() -> u32 {
    3
}

fn default_time_window_minutes() -> i64 {
    5
}

fn default_min_history() -> usize {
    10
}

fn default_deviation_threshold_hours() -> u32 {
    3
}

fn default_history_lookback_days() -> i64 {
    90
}

fn default_history_limit() -> usize {
    100
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            amount_threshold: default_amount_threshold(),
            location_radius_km: default_location_radius_km(),
            device_memory_days: default_device_memory_days(),
            max_transactions: default_max_transactions(),
            time_window_minutes: default_time_window_minutes(),
            min_history: default_min_history(),
            deviation_threshold_hours: default_deviation_threshold_hours(),
            history_lookback_days: default_history_lookback_days(),
            history_limit: default_history_limit(),
        }
    }
}

fn too_large(name: &'static str, max: i64) -> ValidationError {
    ValidationError::ParameterTooLarge { name, max }
}

impl RuleConfig {
    /// Reject zero, negative and out-of-range parameters
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount_threshold <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveParameter("amount_threshold"));
        }
        if self.location_radius_km.is_nan() || self.location_radius_km <= 0.0 {
            return Err(ValidationError::NonPositiveParameter("location_radius_km"));
        }
        if self.device_memory_days <= 0 {
            return Err(ValidationError::NonPositiveParameter("device_memory_days"));
        }
        if self.max_transactions == 0 {
            return Err(ValidationError::NonPositiveParameter("max_transactions"));
        }
        if self.time_window_minutes <= 0 {
            return Err(ValidationError::NonPositiveParameter("time_window_minutes"));
        }
        if self.deviation_threshold_hours == 0 {
            return Err(ValidationError::NonPositiveParameter("deviation_threshold_hours"));
        }
        if self.history_lookback_days <= 0 {
            return Err(ValidationError::NonPositiveParameter("history_lookback_days"));
        }
        if self.history_limit == 0 {
            return Err(ValidationError::NonPositiveParameter("history_limit"));
        }

        if self.device_memory_days > MAX_RETENTION_DAYS {
            return Err(too_large("device_memory_days", MAX_RETENTION_DAYS));
        }
        if self.time_window_minutes > MAX_TIME_WINDOW_MINUTES {
            return Err(too_large("time_window_minutes", MAX_TIME_WINDOW_MINUTES));
        }
        if self.deviation_threshold_hours > MAX_DEVIATION_THRESHOLD_HOURS {
            return Err(too_large(
                "deviation_threshold_hours",
                i64::from(MAX_DEVIATION_THRESHOLD_HOURS),
            ));
        }
        if self.history_lookback_days > MAX_RETENTION_DAYS {
            return Err(too_large("history_lookback_days", MAX_RETENTION_DAYS));
        }
        Ok(())
    }

    /// Copy with the cached threshold overrides applied
    pub fn with_thresholds(&self, thresholds: &ThresholdConfig) -> Self {
        Self {
            amount_threshold: thresholds.amount_threshold,
            location_radius_km: thresholds.location_radius_km,
            ..self.clone()
        }
    }

    /// The two values exposed as runtime overrides
    pub fn thresholds(&self) -> ThresholdConfig {
        ThresholdConfig {
            amount_threshold: self.amount_threshold,
            location_radius_km: self.location_radius_km,
        }
    }

    pub fn device_memory(&self) -> Duration {
        Duration::days(self.device_memory_days)
    }

    pub fn history_lookback(&self) -> Duration {
        Duration::days(self.history_lookback_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = RuleConfig::default();

        assert_eq!(config.amount_threshold, dec!(1500.00));
        assert_eq!(config.location_radius_km, 100.0);
        assert_eq!(config.device_memory_days, 90);
        assert_eq!(config.max_transactions, 3);
        assert_eq!(config.time_window_minutes, 5);
        assert_eq!(config.min_history, 10);
        assert_eq!(config.deviation_threshold_hours, 3);
        assert_eq!(config.history_lookback_days, 90);
        assert_eq!(config.history_limit, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RuleConfig =
            serde_json::from_str(r#"{"max_transactions": 10, "amount_threshold": "99.5"}"#)
                .unwrap();
        assert_eq!(config.max_transactions, 10);
        assert_eq!(config.amount_threshold, dec!(99.5));
        assert_eq!(config.time_window_minutes, 5);
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        let config = RuleConfig {
            amount_threshold: Decimal::ZERO,
            ..RuleConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::NonPositiveParameter("amount_threshold"))
        );

        let config = RuleConfig {
            location_radius_km: -1.0,
            ..RuleConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = RuleConfig {
            device_memory_days: 1_000_000_000,
            ..RuleConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ParameterTooLarge {
                name: "device_memory_days",
                max: MAX_RETENTION_DAYS
            })
        );

        let config = RuleConfig {
            history_lookback_days: MAX_RETENTION_DAYS + 1,
            ..RuleConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RuleConfig {
            time_window_minutes: i64::MAX,
            ..RuleConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RuleConfig {
            deviation_threshold_hours: u32::MAX,
            ..RuleConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RuleConfig {
            device_memory_days: MAX_RETENTION_DAYS,
            history_lookback_days: MAX_RETENTION_DAYS,
            time_window_minutes: MAX_TIME_WINDOW_MINUTES,
            deviation_threshold_hours: MAX_DEVIATION_THRESHOLD_HOURS,
            ..RuleConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_overlay() {
        let base = RuleConfig {
            max_transactions: 7,
            ..RuleConfig::default()
        };
        let overlaid = base.with_thresholds(&ThresholdConfig {
            amount_threshold: dec!(5000),
            location_radius_km: 25.0,
        });

        assert_eq!(overlaid.amount_threshold, dec!(5000));
        assert_eq!(overlaid.location_radius_km, 25.0);
        assert_eq!(overlaid.max_transactions, 7);
        assert_eq!(overlaid.thresholds().location_radius_km, 25.0);
    }
}
