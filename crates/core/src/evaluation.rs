//! Evaluation - persisted verdict and its lifecycle
//!
//! ```text
//!                 ┌──────────── LOW ───────────► APPROVED
//! evaluate ───────┼──────────── MEDIUM ────────► PENDING_REVIEW ──analyst──► APPROVED | REJECTED
//!                 └──────────── HIGH ──────────► REJECTED
//! ```
//!
//! User self-authentication is only accepted while the record is
//! `PENDING_REVIEW` and never changes the status by itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumString};

use crate::error::{LifecycleError, ValidationError};
use crate::location::Location;
use crate::risk::RiskLevel;
use crate::transaction::Transaction;

/// Lifecycle status of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Closed automatically or by an analyst
    Approved,
    /// Waiting for an analyst
    PendingReview,
    /// Closed automatically or by an analyst
    Rejected,
}

impl TransactionStatus {
    /// Status assigned on creation
    pub fn initial_for(risk_level: RiskLevel) -> Self {
        match risk_level {
            RiskLevel::Low => TransactionStatus::Approved,
            RiskLevel::Medium => TransactionStatus::PendingReview,
            RiskLevel::High => TransactionStatus::Rejected,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::PendingReview)
    }
}

/// Terminal decision an analyst can record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn as_status(&self) -> TransactionStatus {
        match self {
            ReviewDecision::Approved => TransactionStatus::Approved,
            ReviewDecision::Rejected => TransactionStatus::Rejected,
        }
    }
}

impl FromStr for ReviewDecision {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(ReviewDecision::Approved),
            "REJECTED" => Ok(ReviewDecision::Rejected),
            other => Err(ValidationError::InvalidDecision(other.to_string())),
        }
    }
}

/// Risk assessment of one transaction.
///
/// Created once by the evaluator, then mutated at most by an analyst
/// decision and by the user's self-authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub transaction_id: String,
    pub user_id: String,
    pub risk_level: RiskLevel,
    /// Reason codes in rule order
    pub reasons: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub status: TransactionStatus,

    pub amount: Option<Decimal>,
    pub location: Option<Location>,
    pub transaction_type: Option<String>,
    pub description: Option<String>,

    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,

    pub user_authenticated: Option<bool>,
    pub user_authenticated_at: Option<DateTime<Utc>>,
}

impl Evaluation {
    /// Create an evaluation with the status seeded from the risk level
    pub fn new(
        transaction: &Transaction,
        risk_level: RiskLevel,
        reasons: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: transaction.transaction_id().to_string(),
            user_id: transaction.user_id().to_string(),
            risk_level,
            reasons,
            created_at,
            status: TransactionStatus::initial_for(risk_level),
            amount: Some(transaction.amount().value()),
            location: Some(transaction.location()),
            transaction_type: transaction.kind().map(|k| k.to_string()),
            description: transaction.description().map(str::to_string),
            reviewed_by: None,
            reviewed_at: None,
            user_authenticated: None,
            user_authenticated_at: None,
        }
    }

    /// Whether an analyst has to look at this record
    pub fn requires_review(&self) -> bool {
        self.risk_level >= RiskLevel::Medium
    }

    /// Record an analyst decision.
    ///
    /// Overwrites any earlier decision, including on records that are
    /// already terminal. Returns the status the record had before.
    pub fn apply_review(
        &mut self,
        decision: ReviewDecision,
        analyst_id: &str,
        at: DateTime<Utc>,
    ) -> Result<TransactionStatus, ValidationError> {
        if analyst_id.trim().is_empty() {
            return Err(ValidationError::BlankField("analyst_id"));
        }

        let previous = self.status;
        self.status = decision.as_status();
        self.reviewed_by = Some(analyst_id.to_string());
        self.reviewed_at = Some(at);
        Ok(previous)
    }

    /// Record the user's confirmation or denial. Last write wins.
    pub fn authenticate_by_user(
        &mut self,
        confirmed: bool,
        at: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        if self.status != TransactionStatus::PendingReview {
            return Err(LifecycleError::NotPendingReview {
                transaction_id: self.transaction_id.clone(),
                status: self.status,
            });
        }

        self.user_authenticated = Some(confirmed);
        self.user_authenticated_at = Some(at);
        Ok(())
    }
}
