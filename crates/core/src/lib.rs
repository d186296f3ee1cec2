//! FraudGuard Core - Domain types
//!
//! This crate contains the fundamental types used across FraudGuard:
//! - `TransactionAmount`: Signed, non-zero decimal amount
//! - `Location`: Range-checked coordinate pair, plus Haversine distance in [`geo`]
//! - `Transaction`: Validated, immutable submission
//! - `Evaluation`: Persisted risk verdict and its lifecycle status

pub mod amount;
pub mod error;
pub mod evaluation;
pub mod geo;
pub mod location;
pub mod risk;
pub mod transaction;

pub use amount::TransactionAmount;
pub use error::{LifecycleError, ValidationError};
pub use evaluation::{Evaluation, ReviewDecision, TransactionStatus};
pub use location::Location;
pub use risk::RiskLevel;
pub use transaction::{Transaction, TransactionKind};
