//! Application context - wires everything together

use fraudguard_engine::{
    AuthenticateTransaction, EngineConfig, EvaluateTransaction, EvaluatorStores,
    ReviewTransaction,
};
use fraudguard_store::{
    sqlite, JsonlReviewQueue, ReviewQueueReader, SqliteCache, SqliteEvaluationRepository,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Application context - one SQLite database and one review queue file
/// per data directory
pub struct AppContext {
    pub evaluator: EvaluateTransaction,
    pub review: ReviewTransaction,
    pub authenticate: AuthenticateTransaction,
    pub evaluations: Arc<SqliteEvaluationRepository>,
    pub cache: Arc<SqliteCache>,
    queue: ReviewQueueReader,
    queue_path: PathBuf,
}

impl AppContext {
    /// Create a new application context
    pub async fn new(
        data_path: impl AsRef<Path>,
        config: EngineConfig,
    ) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref();
        let db_path = data_path.join("fraudguard.db");
        let queue_path = data_path.join("review_queue.jsonl");

        std::fs::create_dir_all(data_path)?;

        let pool = sqlite::connect(&db_path).await?;
        let evaluations = Arc::new(SqliteEvaluationRepository::new(pool.clone()));
        evaluations.init().await?;
        let cache = Arc::new(SqliteCache::new(pool));
        cache.init().await?;

        let publisher = JsonlReviewQueue::open(&queue_path)?;
        let queue = publisher.reader();

        let stores = EvaluatorStores {
            evaluations: evaluations.clone(),
            history: evaluations.clone(),
            locations: cache.clone(),
            config: cache.clone(),
            devices: cache.clone(),
            velocity: cache.clone(),
            publisher: Arc::new(publisher),
        };

        let evaluator = EvaluateTransaction::new(stores, config)?;
        let review = ReviewTransaction::new(evaluations.clone());
        let authenticate = AuthenticateTransaction::new(evaluations.clone());

        debug!(db = %db_path.display(), queue = %queue_path.display(), "Context ready");

        Ok(Self {
            evaluator,
            review,
            authenticate,
            evaluations,
            cache,
            queue,
            queue_path,
        })
    }

    /// Load the engine configuration, or the defaults when no file is given
    pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, anyhow::Error> {
        match path {
            Some(path) => Ok(EngineConfig::from_file(path)?),
            None => Ok(EngineConfig::default()),
        }
    }

    /// Reader over the manual review queue
    pub fn queue(&self) -> &ReviewQueueReader {
        &self.queue
    }

    /// Get review queue path
    pub fn queue_path(&self) -> &Path {
        &self.queue_path
    }
}
