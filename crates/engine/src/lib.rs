//! # FraudGuard Engine
//!
//! The three operations exposed to callers:
//!
//! - [`EvaluateTransaction`]: payload → rules → persisted evaluation
//! - [`ReviewTransaction`]: analyst decision on an evaluation
//! - [`AuthenticateTransaction`]: user confirms or denies a pending transaction
//!
//! ```text
//! payload ──► Transaction ──► HistoricalContext ──► RulePipeline
//!                                                        │
//!            review queue ◄── (MEDIUM/HIGH) ◄── save ◄── Evaluation
//! ```

pub mod authenticate;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod payload;
pub mod review;

pub use authenticate::AuthenticateTransaction;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use evaluate::{EvaluateTransaction, EvaluationResult, EvaluatorStores};
pub use payload::{LocationPayload, TransactionPayload};
pub use review::ReviewTransaction;
