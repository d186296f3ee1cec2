//! Unusual time-of-day rule
//!
//! Builds an hour-of-day histogram (UTC) from the user's recent evaluations
//! and measures how far the current hour is from that pattern. Distances
//! wrap around midnight: 23:00 and 01:00 are two hours apart.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use fraudguard_core::{RiskLevel, Transaction, ValidationError};
use fraudguard_store::EvaluationHistory;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::RuleId;
use crate::config::{MAX_DEVIATION_THRESHOLD_HOURS, MAX_RETENTION_DAYS};
use crate::fallback::Degrade;
use crate::outcome::RuleOutcome;
use crate::rule::{HistoricalContext, RiskRule};

pub const REASON_UNUSUAL_TIME: &str = "unusual_transaction_time";
pub const REASON_MODERATELY_UNUSUAL_TIME: &str = "moderately_unusual_time";
pub const REASON_TIME_CHECK_FAILED: &str = "unusual_time_check_failed";

/// Below this share of history, an hour the user has used still counts as rare
const RARE_HOUR_SHARE: f64 = 0.05;

/// Transaction counts per hour of day
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourlyPattern {
    counts: [u32; 24],
}

impl HourlyPattern {
    /// Parse RFC 3339 timestamps, skipping any that do not parse
    pub fn from_timestamps<'a>(timestamps: impl IntoIterator<Item = &'a str>) -> Self {
        let mut pattern = Self::default();
        for raw in timestamps {
            match DateTime::parse_from_rfc3339(raw) {
                Ok(t) => pattern.counts[t.with_timezone(&Utc).hour() as usize] += 1,
                Err(error) => debug!(timestamp = raw, error = %error, "Skipping malformed timestamp"),
            }
        }
        pattern
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn count(&self, hour: u32) -> u32 {
        self.counts[(hour % 24) as usize]
    }

    /// Busiest hour; ties go to the earliest hour
    pub fn most_common_hour(&self) -> Option<u32> {
        let mut best: Option<(u32, u32)> = None;
        for (hour, &count) in self.counts.iter().enumerate() {
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((hour as u32, count));
            }
        }
        best.map(|(hour, _)| hour)
    }

    /// How many hours `hour` sits from the usual pattern, or `None` if the
    /// hour is common enough to be normal.
    ///
    /// - hour never used: distance to the nearest used hour
    /// - hour used, but under 5% of history: distance to the busiest hour
    pub fn deviation(&self, hour: u32) -> Option<u32> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let count = self.count(hour);
        if count == 0 {
            return (0..24u32)
                .filter(|&h| self.count(h) > 0)
                .map(|h| circular_distance(hour, h))
                .min();
        }

        let share = f64::from(count) / f64::from(total);
        if share < RARE_HOUR_SHARE {
            return self
                .most_common_hour()
                .map(|busiest| circular_distance(hour, busiest));
        }

        None
    }
}

/// Distance between two hours of the day, wrapping at midnight
pub fn circular_distance(a: u32, b: u32) -> u32 {
    let diff = a.abs_diff(b) % 24;
    diff.min(24 - diff)
}

pub struct UnusualTimeRule {
    history: Arc<dyn EvaluationHistory>,
    min_history: usize,
    threshold_hours: u32,
    lookback: Duration,
    limit: usize,
}

impl UnusualTimeRule {
    pub fn new(
        history: Arc<dyn EvaluationHistory>,
        min_history: usize,
        threshold_hours: u32,
        lookback: Duration,
        limit: usize,
    ) -> Result<Self, ValidationError> {
        if threshold_hours == 0 {
            return Err(ValidationError::NonPositiveParameter("deviation_threshold_hours"));
        }
        if lookback <= Duration::zero() {
            return Err(ValidationError::NonPositiveParameter("history_lookback_days"));
        }
        if limit == 0 {
            return Err(ValidationError::NonPositiveParameter("history_limit"));
        }
        if threshold_hours > MAX_DEVIATION_THRESHOLD_HOURS {
            return Err(ValidationError::ParameterTooLarge {
                name: "deviation_threshold_hours",
                max: i64::from(MAX_DEVIATION_THRESHOLD_HOURS),
            });
        }
        if lookback > Duration::days(MAX_RETENTION_DAYS) {
            return Err(ValidationError::ParameterTooLarge {
                name: "history_lookback_days",
                max: MAX_RETENTION_DAYS,
            });
        }
        Ok(Self {
            history,
            min_history,
            threshold_hours,
            lookback,
            limit,
        })
    }

    fn degraded() -> RuleOutcome {
        RuleOutcome::flagged(
            RiskLevel::Low,
            REASON_TIME_CHECK_FAILED,
            "Could not check unusual time pattern",
        )
    }

    async fn check(&self, transaction: &Transaction) -> Result<RuleOutcome, RuleOutcome> {
        let at = transaction.timestamp();
        let Some(since) = at.checked_sub_signed(self.lookback) else {
            debug!(rule = %self.id(), timestamp = %at, "Lookback start out of range");
            return Err(Self::degraded());
        };
        let times = self
            .history
            .creation_times(transaction.user_id(), since, self.limit)
            .await
            .or_degrade(self.id(), Self::degraded)?;

        if times.len() < self.min_history {
            return Ok(RuleOutcome::pass_with(
                "Insufficient transaction history to establish pattern",
            ));
        }

        let pattern = HourlyPattern::from_timestamps(times.iter().map(String::as_str));
        let hour = at.hour();

        let verdict = match pattern.deviation(hour) {
            Some(d) if d >= self.threshold_hours.saturating_mul(2) => Some((RiskLevel::High, REASON_UNUSUAL_TIME, d)),
            Some(d) if d >= self.threshold_hours => {
                Some((RiskLevel::Medium, REASON_MODERATELY_UNUSUAL_TIME, d))
            }
            _ => None,
        };

        Ok(match verdict {
            Some((level, reason, deviation)) => RuleOutcome::flagged(
                level,
                reason,
                format!(
                    "Transaction at {}:00 is {} hours from normal pattern",
                    hour, deviation
                ),
            ),
            None => RuleOutcome::pass_with(format!(
                "Transaction at {}:00 is within normal pattern",
                hour
            )),
        })
    }
}

#[async_trait]
impl RiskRule for UnusualTimeRule {
    fn id(&self) -> RuleId {
        RuleId::UnusualTime
    }

    async fn evaluate(&self, transaction: &Transaction, _: &HistoricalContext) -> RuleOutcome {
        self.check(transaction)
            .await
            .unwrap_or_else(|degraded| degraded)
    }
}
