//! Cache contracts persisted in SQLite so consecutive runs share state

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fraudguard_core::Location;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeSet;

use crate::error::{expires_at, StoreError, StoreResult};
use crate::traits::{ConfigCache, DeviceRegistry, LocationCache, ThresholdConfig, VelocityWindow};

const THRESHOLDS_KEY: &str = "thresholds";

/// Location, config, device and velocity state in one database
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema
    pub async fn init(&self) -> StoreResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS cache_locations (
                user_id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                expires_ms INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS cache_config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS cache_disabled_rules (
                rule_id TEXT PRIMARY KEY
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS cache_devices (
                user_id TEXT NOT NULL,
                device_id TEXT NOT NULL,
                expires_ms INTEGER NOT NULL,
                PRIMARY KEY (user_id, device_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS cache_velocity (
                user_id TEXT NOT NULL,
                member TEXT NOT NULL,
                score_ms INTEGER NOT NULL,
                PRIMARY KEY (user_id, member)
            )
            "#,
        ];

        for sql in statements {
            sqlx::query(sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Write a raw location payload, bypassing serialization
    pub async fn put_raw_location(
        &self,
        user_id: &str,
        payload: &str,
        ttl: Duration,
    ) -> StoreResult<()> {
        let expires_ms = expires_at(ttl)?.timestamp_millis();
        sqlx::query(
            r#"
            INSERT INTO cache_locations (user_id, payload, expires_ms)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                payload = excluded.payload,
                expires_ms = excluded.expires_ms
            "#,
        )
        .bind(user_id)
        .bind(payload)
        .bind(expires_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl LocationCache for SqliteCache {
    async fn get_user_location(&self, user_id: &str) -> StoreResult<Option<Location>> {
        let row = sqlx::query(
            "SELECT payload FROM cache_locations WHERE user_id = ? AND expires_ms > ?",
        )
        .bind(user_id)
        .bind(Utc::now().timestamp_millis())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload")?;
        let location: Location = serde_json::from_str(&payload)
            .map_err(|e| StoreError::corrupt(format!("location:{}", user_id), e))?;
        Ok(Some(location))
    }

    async fn set_user_location(
        &self,
        user_id: &str,
        location: Location,
        ttl: Duration,
    ) -> StoreResult<()> {
        let payload = serde_json::to_string(&location)?;
        self.put_raw_location(user_id, &payload, ttl).await
    }
}

#[async_trait]
impl ConfigCache for SqliteCache {
    async fn get_threshold_config(&self) -> StoreResult<Option<ThresholdConfig>> {
        let row = sqlx::query("SELECT value FROM cache_config WHERE key = ?")
            .bind(THRESHOLDS_KEY)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let value: String = row.try_get("value")?;
                let config = serde_json::from_str(&value)
                    .map_err(|e| StoreError::corrupt(THRESHOLDS_KEY, e))?;
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    async fn set_threshold_config(&self, config: &ThresholdConfig) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cache_config (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(THRESHOLDS_KEY)
        .bind(serde_json::to_string(config)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn disabled_rules(&self) -> StoreResult<BTreeSet<String>> {
        let rows = sqlx::query("SELECT rule_id FROM cache_disabled_rules")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("rule_id").map_err(StoreError::from))
            .collect()
    }

    async fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> StoreResult<()> {
        let sql = if enabled {
            "DELETE FROM cache_disabled_rules WHERE rule_id = ?"
        } else {
            "INSERT OR IGNORE INTO cache_disabled_rules (rule_id) VALUES (?)"
        };
        sqlx::query(sql).bind(rule_id).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DeviceRegistry for SqliteCache {
    async fn is_known(&self, user_id: &str, device_id: &str) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 FROM cache_devices
            WHERE user_id = ? AND device_id = ? AND expires_ms > ?
            "#,
        )
        .bind(user_id)
        .bind(device_id)
        .bind(Utc::now().timestamp_millis())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn register(&self, user_id: &str, device_id: &str, ttl: Duration) -> StoreResult<()> {
        let expires_ms = expires_at(ttl)?.timestamp_millis();
        sqlx::query(
            r#"
            INSERT INTO cache_devices (user_id, device_id, expires_ms) VALUES (?, ?, ?)
            ON CONFLICT(user_id, device_id) DO UPDATE SET expires_ms = excluded.expires_ms
            "#,
        )
        .bind(user_id)
        .bind(device_id)
        .bind(expires_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl VelocityWindow for SqliteCache {
    async fn record(&self, user_id: &str, member: &str, score_ms: i64) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cache_velocity (user_id, member, score_ms) VALUES (?, ?, ?)
            ON CONFLICT(user_id, member) DO UPDATE SET score_ms = excluded.score_ms
            "#,
        )
        .bind(user_id)
        .bind(member)
        .bind(score_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn prune_before(&self, user_id: &str, min_score_ms: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM cache_velocity WHERE user_id = ? AND score_ms < ?")
            .bind(user_id)
            .bind(min_score_ms)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_between(&self, user_id: &str, min_ms: i64, max_ms: i64) -> StoreResult<u64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n FROM cache_velocity
            WHERE user_id = ? AND score_ms >= ? AND score_ms <= ?
            "#,
        )
        .bind(user_id)
        .bind(min_ms)
        .bind(max_ms)
        .fetch_one(&self.pool)
        .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::connect;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    async fn cache(dir: &TempDir) -> SqliteCache {
        let pool = connect(dir.path().join("cache.db")).await.unwrap();
        let cache = SqliteCache::new(pool);
        cache.init().await.unwrap();
        cache
    }

    #[tokio::test]
    async fn test_location_round_trip_and_expiry() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        let loc = Location::new(48.8566, 2.3522).unwrap();

        assert_eq!(cache.get_user_location("U-1").await.unwrap(), None);

        cache.set_user_location("U-1", loc, Duration::seconds(86400)).await.unwrap();
        assert_eq!(cache.get_user_location("U-1").await.unwrap(), Some(loc));

        cache.set_user_location("U-1", loc, Duration::seconds(-1)).await.unwrap();
        assert_eq!(cache.get_user_location("U-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_location_is_reported() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;

        cache.put_raw_location("U-1", "{not json", Duration::hours(1)).await.unwrap();
        assert!(matches!(
            cache.get_user_location("U-1").await,
            Err(StoreError::Corrupt { .. })
        ));

        cache
            .put_raw_location("U-2", r#"{"latitude":123.0,"longitude":0.0}"#, Duration::hours(1))
            .await
            .unwrap();
        assert!(cache.get_user_location("U-2").await.is_err());
    }

    #[tokio::test]
    async fn test_threshold_config() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        assert_eq!(cache.get_threshold_config().await.unwrap(), None);

        let config = ThresholdConfig {
            amount_threshold: dec!(2500.00),
            location_radius_km: 50.0,
        };
        cache.set_threshold_config(&config).await.unwrap();
        assert_eq!(cache.get_threshold_config().await.unwrap(), Some(config));
    }

    #[tokio::test]
    async fn test_disabled_rules() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;

        cache.set_rule_enabled("rule_location_check", false).await.unwrap();
        cache.set_rule_enabled("rule_location_check", false).await.unwrap();
        cache.set_rule_enabled("rule_unusual_time", false).await.unwrap();
        cache.set_rule_enabled("rule_unusual_time", true).await.unwrap();

        let disabled = cache.disabled_rules().await.unwrap();
        assert_eq!(disabled.into_iter().collect::<Vec<_>>(), vec!["rule_location_check"]);
    }

    #[tokio::test]
    async fn test_devices() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;

        assert!(!cache.is_known("U-1", "dev-a").await.unwrap());
        cache.register("U-1", "dev-a", Duration::days(90)).await.unwrap();
        assert!(cache.is_known("U-1", "dev-a").await.unwrap());
        assert!(!cache.is_known("U-2", "dev-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_velocity_window() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;

        for (i, score) in [1_000, 2_000, 3_000].iter().enumerate() {
            cache.record("U-1", &format!("TX-{}", i), *score).await.unwrap();
        }

        assert_eq!(cache.prune_before("U-1", 2_000).await.unwrap(), 1);
        assert_eq!(cache.count_between("U-1", 2_000, 3_000).await.unwrap(), 2);
        assert_eq!(cache.count_between("U-1", 2_001, 3_000).await.unwrap(), 1);
        assert_eq!(cache.count_between("U-9", 0, i64::MAX).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ttl_past_the_calendar_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        let loc = Location::new(48.8566, 2.3522).unwrap();
        let huge = Duration::days(1_000_000_000);

        let err = cache.set_user_location("U-1", loc, huge).await.unwrap_err();
        assert!(matches!(err, StoreError::TtlOutOfRange(_)));
        let err = cache.register("U-1", "dev-a", huge).await.unwrap_err();
        assert!(matches!(err, StoreError::TtlOutOfRange(_)));

        assert_eq!(cache.get_user_location("U-1").await.unwrap(), None);
        assert!(!cache.is_known("U-1", "dev-a").await.unwrap());
    }
}
