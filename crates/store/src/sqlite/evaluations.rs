//! Evaluation records in SQLite

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fraudguard_core::{Evaluation, Location, RiskLevel, TransactionStatus};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::{StoreError, StoreResult};
use crate::traits::{EvaluationHistory, EvaluationRepository};

const COLUMNS: &str = "transaction_id, user_id, risk_level, reasons, created_at, created_ms, \
     status, amount, latitude, longitude, transaction_type, description, \
     reviewed_by, reviewed_at, user_authenticated, user_authenticated_at";

/// Evaluation repository over a shared pool
pub struct SqliteEvaluationRepository {
    pool: SqlitePool,
}

impl SqliteEvaluationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema
    pub async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS evaluations (
                transaction_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                risk_level TEXT NOT NULL,
                reasons TEXT NOT NULL,
                created_at TEXT NOT NULL,
                created_ms INTEGER NOT NULL,
                status TEXT NOT NULL,
                amount TEXT,
                latitude REAL,
                longitude REAL,
                transaction_type TEXT,
                description TEXT,
                reviewed_by TEXT,
                reviewed_at TEXT,
                user_authenticated INTEGER,
                user_authenticated_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_evaluations_user
            ON evaluations(user_id, created_ms)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert(&self, evaluation: &Evaluation) -> StoreResult<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO evaluations ({}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            COLUMNS
        );
        sqlx::query(&sql)
            .bind(&evaluation.transaction_id)
            .bind(&evaluation.user_id)
            .bind(evaluation.risk_level.to_string())
            .bind(serde_json::to_string(&evaluation.reasons)?)
            .bind(evaluation.created_at.to_rfc3339())
            .bind(evaluation.created_at.timestamp_millis())
            .bind(evaluation.status.to_string())
            .bind(evaluation.amount.map(|a| a.to_string()))
            .bind(evaluation.location.map(|l| l.latitude()))
            .bind(evaluation.location.map(|l| l.longitude()))
            .bind(&evaluation.transaction_type)
            .bind(&evaluation.description)
            .bind(&evaluation.reviewed_by)
            .bind(evaluation.reviewed_at.map(|t| t.to_rfc3339()))
            .bind(evaluation.user_authenticated)
            .bind(evaluation.user_authenticated_at.map(|t| t.to_rfc3339()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn parse_time(key: &str, raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(key, e))
}

fn parse_optional_time(key: &str, raw: Option<String>) -> StoreResult<Option<DateTime<Utc>>> {
    raw.map(|s| parse_time(key, &s)).transpose()
}

fn row_to_evaluation(row: &SqliteRow) -> StoreResult<Evaluation> {
    let transaction_id: String = row.try_get("transaction_id")?;
    let key = transaction_id.as_str();

    let risk_level: String = row.try_get("risk_level")?;
    let risk_level: RiskLevel = risk_level
        .parse()
        .map_err(|e| StoreError::corrupt(key, e))?;

    let status: String = row.try_get("status")?;
    let status: TransactionStatus = status.parse().map_err(|e| StoreError::corrupt(key, e))?;

    let reasons: String = row.try_get("reasons")?;
    let reasons: Vec<String> = serde_json::from_str(&reasons)?;

    let amount: Option<String> = row.try_get("amount")?;
    let amount = amount
        .map(|a| a.parse::<Decimal>())
        .transpose()
        .map_err(|e| StoreError::corrupt(key, e))?;

    let latitude: Option<f64> = row.try_get("latitude")?;
    let longitude: Option<f64> = row.try_get("longitude")?;
    let location = match (latitude, longitude) {
        (Some(lat), Some(lon)) => {
            Some(Location::new(lat, lon).map_err(|e| StoreError::corrupt(key, e))?)
        }
        _ => None,
    };

    let created_at: String = row.try_get("created_at")?;

    Ok(Evaluation {
        created_at: parse_time(key, &created_at)?,
        user_id: row.try_get("user_id")?,
        risk_level,
        reasons,
        status,
        amount,
        location,
        transaction_type: row.try_get("transaction_type")?,
        description: row.try_get("description")?,
        reviewed_by: row.try_get("reviewed_by")?,
        reviewed_at: parse_optional_time(key, row.try_get("reviewed_at")?)?,
        user_authenticated: row.try_get("user_authenticated")?,
        user_authenticated_at: parse_optional_time(key, row.try_get("user_authenticated_at")?)?,
        transaction_id,
    })
}

#[async_trait]
impl EvaluationRepository for SqliteEvaluationRepository {
    async fn save(&self, evaluation: &Evaluation) -> StoreResult<()> {
        self.upsert(evaluation).await
    }

    async fn get_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Option<Evaluation>> {
        let sql = format!("SELECT {} FROM evaluations WHERE transaction_id = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_evaluation).transpose()
    }

    async fn get_all(&self) -> StoreResult<Vec<Evaluation>> {
        let sql = format!(
            "SELECT {} FROM evaluations ORDER BY created_ms DESC, transaction_id DESC",
            COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_evaluation).collect()
    }

    async fn get_by_user(&self, user_id: &str) -> StoreResult<Vec<Evaluation>> {
        let sql = format!(
            "SELECT {} FROM evaluations WHERE user_id = ? \
             ORDER BY created_ms DESC, transaction_id DESC",
            COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_evaluation).collect()
    }

    async fn update(&self, evaluation: &Evaluation) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE evaluations SET
                status = ?,
                reviewed_by = ?,
                reviewed_at = ?,
                user_authenticated = ?,
                user_authenticated_at = ?,
                risk_level = ?,
                reasons = ?
            WHERE transaction_id = ?
            "#,
        )
        .bind(evaluation.status.to_string())
        .bind(&evaluation.reviewed_by)
        .bind(evaluation.reviewed_at.map(|t| t.to_rfc3339()))
        .bind(evaluation.user_authenticated)
        .bind(evaluation.user_authenticated_at.map(|t| t.to_rfc3339()))
        .bind(evaluation.risk_level.to_string())
        .bind(serde_json::to_string(&evaluation.reasons)?)
        .bind(&evaluation.transaction_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(evaluation.transaction_id.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl EvaluationHistory for SqliteEvaluationRepository {
    async fn creation_times(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT created_at FROM evaluations
            WHERE user_id = ? AND created_ms >= ?
            ORDER BY created_ms DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(since.timestamp_millis())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("created_at").map_err(StoreError::from))
            .collect()
    }
}
