//! Risk level with total ordering
//!
//! `Low < Medium < High`. Aggregation is `max()` over rule verdicts.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum_macros::{Display, EnumString};

/// Ordered risk severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum RiskLevel {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

impl RiskLevel {
    /// Most severe level in the iterator, `Low` when empty
    pub fn aggregate(levels: impl IntoIterator<Item = RiskLevel>) -> RiskLevel {
        levels.into_iter().max().unwrap_or_default()
    }
}
