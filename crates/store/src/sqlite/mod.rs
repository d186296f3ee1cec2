//! SQLite adapters (sqlx)
//!
//! One pool per data directory; the repository and the cache each own
//! their tables and create them in `init()`.

mod cache;
mod evaluations;

pub use cache::SqliteCache;
pub use evaluations::SqliteEvaluationRepository;

use sqlx::SqlitePool;
use std::path::Path;
use tracing::debug;

use crate::error::StoreResult;

/// Open (or create) the database file at `db_path`
pub async fn connect(db_path: impl AsRef<Path>) -> StoreResult<SqlitePool> {
    let db_url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());
    let pool = SqlitePool::connect(&db_url).await?;
    debug!(db = %db_path.as_ref().display(), "Connected to SQLite");
    Ok(pool)
}
