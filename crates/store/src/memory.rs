//! In-memory adapters backed by tokio `RwLock`s

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fraudguard_core::{Evaluation, Location};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::error::{expires_at, StoreError, StoreResult};
use crate::traits::{
    ConfigCache, DeviceRegistry, EvaluationHistory, EvaluationRepository, LocationCache,
    ThresholdConfig, VelocityWindow,
};

/// Evaluation records held in a map keyed by transaction id
#[derive(Default)]
pub struct InMemoryEvaluationRepository {
    records: RwLock<HashMap<String, Evaluation>>,
}

impl InMemoryEvaluationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn newest_first(mut evaluations: Vec<Evaluation>) -> Vec<Evaluation> {
    evaluations.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.transaction_id.cmp(&a.transaction_id))
    });
    evaluations
}

#[async_trait]
impl EvaluationRepository for InMemoryEvaluationRepository {
    async fn save(&self, evaluation: &Evaluation) -> StoreResult<()> {
        self.records
            .write()
            .await
            .insert(evaluation.transaction_id.clone(), evaluation.clone());
        Ok(())
    }

    async fn get_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Option<Evaluation>> {
        Ok(self.records.read().await.get(transaction_id).cloned())
    }

    async fn get_all(&self) -> StoreResult<Vec<Evaluation>> {
        let all = self.records.read().await.values().cloned().collect();
        Ok(newest_first(all))
    }

    async fn get_by_user(&self, user_id: &str) -> StoreResult<Vec<Evaluation>> {
        let mine = self
            .records
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(mine))
    }

    async fn update(&self, evaluation: &Evaluation) -> StoreResult<()> {
        let mut records = self.records.write().await;
        match records.get_mut(&evaluation.transaction_id) {
            Some(existing) => {
                *existing = evaluation.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(evaluation.transaction_id.clone())),
        }
    }
}

#[async_trait]
impl EvaluationHistory for InMemoryEvaluationRepository {
    async fn creation_times(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<String>> {
        let mine = self.get_by_user(user_id).await?;
        Ok(mine
            .into_iter()
            .filter(|e| e.created_at >= since)
            .take(limit)
            .map(|e| e.created_at.to_rfc3339())
            .collect())
    }
}

/// Every cache contract in one process-local structure
#[derive(Default)]
pub struct InMemoryCache {
    locations: RwLock<HashMap<String, (Location, DateTime<Utc>)>>,
    thresholds: RwLock<Option<ThresholdConfig>>,
    disabled: RwLock<BTreeSet<String>>,
    devices: RwLock<HashMap<(String, String), DateTime<Utc>>>,
    velocity: RwLock<HashMap<String, HashMap<String, i64>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocationCache for InMemoryCache {
    async fn get_user_location(&self, user_id: &str) -> StoreResult<Option<Location>> {
        let now = Utc::now();
        let mut locations = self.locations.write().await;
        match locations.get(user_id) {
            Some((location, expires_at)) if *expires_at > now => Ok(Some(*location)),
            Some(_) => {
                locations.remove(user_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_user_location(
        &self,
        user_id: &str,
        location: Location,
        ttl: Duration,
    ) -> StoreResult<()> {
        let expires_at = expires_at(ttl)?;
        let now = Utc::now();
        let mut locations = self.locations.write().await;
        locations.retain(|_, (_, expiry)| *expiry > now);
        locations.insert(user_id.to_string(), (location, expires_at));
        Ok(())
    }
}

#[async_trait]
impl ConfigCache for InMemoryCache {
    async fn get_threshold_config(&self) -> StoreResult<Option<ThresholdConfig>> {
        Ok(self.thresholds.read().await.clone())
    }

    async fn set_threshold_config(&self, config: &ThresholdConfig) -> StoreResult<()> {
        *self.thresholds.write().await = Some(config.clone());
        Ok(())
    }

    async fn disabled_rules(&self) -> StoreResult<BTreeSet<String>> {
        Ok(self.disabled.read().await.clone())
    }

    async fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> StoreResult<()> {
        let mut disabled = self.disabled.write().await;
        if enabled {
            disabled.remove(rule_id);
        } else {
            disabled.insert(rule_id.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryCache {
    async fn is_known(&self, user_id: &str, device_id: &str) -> StoreResult<bool> {
        let key = (user_id.to_string(), device_id.to_string());
        let now = Utc::now();
        let mut devices = self.devices.write().await;
        match devices.get(&key) {
            Some(expires_at) if *expires_at > now => Ok(true),
            Some(_) => {
                devices.remove(&key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn register(&self, user_id: &str, device_id: &str, ttl: Duration) -> StoreResult<()> {
        let expires_at = expires_at(ttl)?;
        let now = Utc::now();
        let mut devices = self.devices.write().await;
        devices.retain(|_, expiry| *expiry > now);
        devices.insert((user_id.to_string(), device_id.to_string()), expires_at);
        Ok(())
    }
}

#[async_trait]
impl VelocityWindow for InMemoryCache {
    async fn record(&self, user_id: &str, member: &str, score_ms: i64) -> StoreResult<()> {
        self.velocity
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .insert(member.to_string(), score_ms);
        Ok(())
    }

    async fn prune_before(&self, user_id: &str, min_score_ms: i64) -> StoreResult<u64> {
        let mut velocity = self.velocity.write().await;
        let Some(entries) = velocity.get_mut(user_id) else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|_, score| *score >= min_score_ms);
        let pruned = (before - entries.len()) as u64;
        if entries.is_empty() {
            velocity.remove(user_id);
        }
        Ok(pruned)
    }

    async fn count_between(&self, user_id: &str, min_ms: i64, max_ms: i64) -> StoreResult<u64> {
        Ok(self
            .velocity
            .read()
            .await
            .get(user_id)
            .map(|entries| {
                entries
                    .values()
                    .filter(|score| (min_ms..=max_ms).contains(*score))
                    .count() as u64
            })
            .unwrap_or(0))
    }
}
