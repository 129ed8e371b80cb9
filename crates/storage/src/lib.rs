//! Persistence for the impact engine
//!
//! Provides the leaderboard snapshot store (all-or-nothing replace of cached
//! leaderboard tables), the steering snapshot cache, stored weekly balances
//! and locally recorded purchases. Postgres and in-memory backends implement
//! the same traits.

mod memory;
mod metrics;
mod postgres;
mod ttl_cache;

use async_trait::async_trait;
use glow_scoring::{
    BalanceSnapshotStore, PurchaseSource, SourceError, SteeringSnapshotCache, WalletUniverseSource,
};
use glow_types::{DelegatorsSnapshot, ImpactLeaderboardSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryBackend;
pub use metrics::{MetricsError, StorageMetrics};
pub use postgres::{PostgresBackend, INSERT_CHUNK_ROWS};
pub use ttl_cache::TtlCache;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored value in {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for SourceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidValue { .. } | StorageError::Serialization(_) => {
                SourceError::InvalidResponse(err.to_string())
            }
            other => SourceError::Unavailable(other.to_string()),
        }
    }
}

/// Cached leaderboard tables. Replacing is all-or-nothing: readers see either
/// the previous snapshot or the new one.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn replace_impact_leaderboard(
        &self,
        snapshot: &ImpactLeaderboardSnapshot,
    ) -> Result<(), StorageError>;

    async fn impact_leaderboard(&self) -> Result<Option<ImpactLeaderboardSnapshot>, StorageError>;

    async fn replace_delegators_leaderboard(
        &self,
        snapshot: &DelegatorsSnapshot,
    ) -> Result<(), StorageError>;

    async fn delegators_leaderboard(&self) -> Result<Option<DelegatorsSnapshot>, StorageError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageBackendConfig {
    Memory,
    Postgres {
        url: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

fn default_max_connections() -> u32 {
    5
}

/// One storage backend exposed through every trait it implements.
#[derive(Clone)]
pub struct StorageManager {
    snapshots: Arc<dyn SnapshotStore>,
    steering_cache: Arc<dyn SteeringSnapshotCache>,
    balances: Arc<dyn BalanceSnapshotStore>,
    purchases: Arc<dyn PurchaseSource>,
    purchasers: Arc<dyn WalletUniverseSource>,
    metrics: Option<Arc<StorageMetrics>>,
}

impl StorageManager {
    pub async fn connect(config: StorageBackendConfig) -> Result<Self, StorageError> {
        match config {
            StorageBackendConfig::Memory => Ok(Self::memory(Arc::new(MemoryBackend::new()))),
            StorageBackendConfig::Postgres {
                url,
                max_connections,
            } => {
                let backend = PostgresBackend::connect(&url, max_connections).await?;
                backend.migrate().await?;
                Ok(Self::from_backend(Arc::new(backend)))
            }
        }
    }

    pub async fn connect_with_metrics(
        config: StorageBackendConfig,
        metrics: Arc<StorageMetrics>,
    ) -> Result<Self, StorageError> {
        let mut manager = Self::connect(config).await?;
        manager.metrics = Some(metrics);
        Ok(manager)
    }

    pub fn memory(backend: Arc<MemoryBackend>) -> Self {
        Self::from_backend(backend)
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: SnapshotStore
            + SteeringSnapshotCache
            + BalanceSnapshotStore
            + PurchaseSource
            + WalletUniverseSource
            + 'static,
    {
        Self {
            snapshots: backend.clone(),
            steering_cache: backend.clone(),
            balances: backend.clone(),
            purchases: backend.clone(),
            purchasers: backend,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<StorageMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn steering_cache(&self) -> Arc<dyn SteeringSnapshotCache> {
        self.steering_cache.clone()
    }

    pub fn balances(&self) -> Arc<dyn BalanceSnapshotStore> {
        self.balances.clone()
    }

    pub fn purchases(&self) -> Arc<dyn PurchaseSource> {
        self.purchases.clone()
    }

    /// Wallets with at least one recorded purchase.
    pub fn purchasers(&self) -> Arc<dyn WalletUniverseSource> {
        self.purchasers.clone()
    }

    pub async fn replace_impact_leaderboard(
        &self,
        snapshot: &ImpactLeaderboardSnapshot,
    ) -> Result<(), StorageError> {
        let _timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.operation_duration_seconds.start_timer());
        let result = self.snapshots.replace_impact_leaderboard(snapshot).await;
        self.record_metric("replace_impact_leaderboard", result.is_err());
        result
    }

    pub async fn impact_leaderboard(&self) -> Result<Option<ImpactLeaderboardSnapshot>, StorageError> {
        let _timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.operation_duration_seconds.start_timer());
        let result = self.snapshots.impact_leaderboard().await;
        self.record_metric("impact_leaderboard", result.is_err());
        result
    }

    pub async fn replace_delegators_leaderboard(
        &self,
        snapshot: &DelegatorsSnapshot,
    ) -> Result<(), StorageError> {
        let _timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.operation_duration_seconds.start_timer());
        let result = self.snapshots.replace_delegators_leaderboard(snapshot).await;
        self.record_metric("replace_delegators_leaderboard", result.is_err());
        result
    }

    pub async fn delegators_leaderboard(&self) -> Result<Option<DelegatorsSnapshot>, StorageError> {
        let _timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.operation_duration_seconds.start_timer());
        let result = self.snapshots.delegators_leaderboard().await;
        self.record_metric("delegators_leaderboard", result.is_err());
        result
    }

    fn record_metric(&self, operation: &str, failed: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.operations_total.with_label_values(&[operation]).inc();
            if failed {
                metrics
                    .operations_failed_total
                    .with_label_values(&[operation])
                    .inc();
            }
        }
    }
}

#[async_trait]
impl SnapshotStore for StorageManager {
    async fn replace_impact_leaderboard(
        &self,
        snapshot: &ImpactLeaderboardSnapshot,
    ) -> Result<(), StorageError> {
        StorageManager::replace_impact_leaderboard(self, snapshot).await
    }

    async fn impact_leaderboard(&self) -> Result<Option<ImpactLeaderboardSnapshot>, StorageError> {
        StorageManager::impact_leaderboard(self).await
    }

    async fn replace_delegators_leaderboard(
        &self,
        snapshot: &DelegatorsSnapshot,
    ) -> Result<(), StorageError> {
        StorageManager::replace_delegators_leaderboard(self, snapshot).await
    }

    async fn delegators_leaderboard(&self) -> Result<Option<DelegatorsSnapshot>, StorageError> {
        StorageManager::delegators_leaderboard(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_types::{RegionTotalsRow, WeekRange};
    use prometheus::Registry;

    fn snapshot() -> ImpactLeaderboardSnapshot {
        ImpactLeaderboardSnapshot {
            week_range: WeekRange::new(97, 110).expect("range"),
            rows: Vec::new(),
            region_totals: RegionTotalsRow::default(),
            computed_at: 1,
        }
    }

    #[tokio::test]
    async fn test_memory_manager_round_trip() {
        let storage = StorageManager::connect(StorageBackendConfig::Memory)
            .await
            .expect("storage");
        assert!(storage.impact_leaderboard().await.expect("read").is_none());

        storage
            .replace_impact_leaderboard(&snapshot())
            .await
            .expect("replace");
        let stored = storage.impact_leaderboard().await.expect("read");
        assert_eq!(stored, Some(snapshot()));
    }

    #[tokio::test]
    async fn test_metrics_recorded_on_replace() {
        let registry = Registry::new();
        let metrics = Arc::new(StorageMetrics::new(&registry).expect("metrics"));
        let storage =
            StorageManager::connect_with_metrics(StorageBackendConfig::Memory, metrics.clone())
                .await
                .expect("storage");

        storage
            .replace_impact_leaderboard(&snapshot())
            .await
            .expect("replace");

        let count = metrics
            .operations_total
            .with_label_values(&["replace_impact_leaderboard"])
            .get();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_backend_config_from_toml_style_json() {
        let config: StorageBackendConfig =
            serde_json::from_str(r#"{"backend": "postgres", "url": "postgres://localhost/glow"}"#)
                .expect("config");
        match config {
            StorageBackendConfig::Postgres {
                max_connections, ..
            } => assert_eq!(max_connections, 5),
            StorageBackendConfig::Memory => panic!("expected postgres"),
        }
    }
}
