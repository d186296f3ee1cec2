//! # FraudGuard Store
//!
//! Contracts for everything the evaluator reads or writes outside the
//! process, and the adapters that back them.
//!
//! ## Contracts
//! - [`EvaluationRepository`] / [`EvaluationHistory`]: evaluation records
//! - [`LocationCache`], [`ConfigCache`], [`DeviceRegistry`], [`VelocityWindow`]: key-value state
//! - [`ReviewPublisher`]: manual review dispatch
//!
//! ## Adapters
//! - `memory`: tokio `RwLock` maps, for tests and embedding
//! - `sqlite`: sqlx SQLite pool shared by the repository and the cache
//! - `queue`: append-only JSONL review queue and an mpsc channel publisher

pub mod error;
pub mod memory;
pub mod queue;
pub mod sqlite;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryCache, InMemoryEvaluationRepository};
pub use queue::{ChannelPublisher, JsonlReviewQueue, ReviewQueueReader};
pub use sqlite::{SqliteCache, SqliteEvaluationRepository};
pub use traits::{
    ConfigCache, DeviceRegistry, EvaluationHistory, EvaluationRepository, LocationCache,
    ReviewPublisher, ReviewSummary, ThresholdConfig, VelocityWindow,
};
