//! Engine configuration, loaded from a JSON file

use chrono::Duration;
use fraudguard_core::ValidationError;
use fraudguard_rules::{RuleConfig, RuleId, MAX_RETENTION_DAYS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Static rule parameters; cached thresholds override two of them
    #[serde(default)]
    pub rules: RuleConfig,

    /// How long a user's last location stays cached
    #[serde(default = "default_location_ttl_secs")]
    pub location_ttl_secs: i64,

    /// Rules that may run; the config cache can still switch them off
    #[serde(default = "default_enabled_rules")]
    pub enabled_rules: Vec<RuleId>,
}

/// Longest location TTL accepted, in seconds
pub const MAX_LOCATION_TTL_SECS: i64 = MAX_RETENTION_DAYS * 86_400;

fn default_location_ttl_secs() -> i64 {
    86_400 // 24 hours
}

fn default_enabled_rules() -> Vec<RuleId> {
    RuleId::all()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: RuleConfig::default(),
            location_ttl_secs: default_location_ttl_secs(),
            enabled_rules: default_enabled_rules(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.rules.validate()?;
        if self.location_ttl_secs <= 0 {
            return Err(ValidationError::NonPositiveParameter("location_ttl_secs"));
        }
        if self.location_ttl_secs > MAX_LOCATION_TTL_SECS {
            return Err(ValidationError::ParameterTooLarge {
                name: "location_ttl_secs",
                max: MAX_LOCATION_TTL_SECS,
            });
        }
        Ok(())
    }

    pub fn location_ttl(&self) -> Duration {
        Duration::seconds(self.location_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.location_ttl_secs, 86_400);
        assert_eq!(config.enabled_rules.len(), 5);
        assert_eq!(config.rules.amount_threshold, dec!(1500.00));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"rules": {{"max_transactions": 5}}, "enabled_rules": ["rule_amount_threshold"]}}"#
        )
        .unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.rules.max_transactions, 5);
        assert_eq!(config.rules.time_window_minutes, 5);
        assert_eq!(config.enabled_rules, vec![RuleId::AmountThreshold]);
        assert_eq!(config.location_ttl_secs, 86_400);
    }

    #[test]
    fn test_from_file_rejects_unknown_rule() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"enabled_rules": ["rule_astrology"]}}"#).unwrap();

        let err = EngineConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_validate_ttl() {
        let config = EngineConfig {
            location_ttl_secs: 0,
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::NonPositiveParameter("location_ttl_secs"))
        );
    }

    #[test]
    fn test_validate_ttl_upper_bound() {
        let config = EngineConfig {
            location_ttl_secs: i64::MAX,
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ParameterTooLarge {
                name: "location_ttl_secs",
                max: MAX_LOCATION_TTL_SECS
            })
        );

        let config = EngineConfig {
            location_ttl_secs: MAX_LOCATION_TTL_SECS,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_checks_rule_bounds() {
        let mut config = EngineConfig::default();
        config.rules.device_memory_days = 1_000_000_000;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::ParameterTooLarge { name: "device_memory_days", .. })
        ));
    }
}
