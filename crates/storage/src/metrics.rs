//! Prometheus metrics for snapshot storage

use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

pub struct StorageMetrics {
    pub operations_total: IntCounterVec,
    pub operations_failed_total: IntCounterVec,
    pub operation_duration_seconds: Histogram,
}

impl StorageMetrics {
    pub fn new(registry: &Registry) -> Result<Self, MetricsError> {
        let metrics = Self::build("glow_storage")?;

        registry.register(Box::new(metrics.operations_total.clone()))?;
        registry.register(Box::new(metrics.operations_failed_total.clone()))?;
        registry.register(Box::new(metrics.operation_duration_seconds.clone()))?;

        Ok(metrics)
    }

    /// Metrics that are not attached to any registry.
    pub fn new_unregistered() -> Result<Self, MetricsError> {
        Self::build("test_storage")
    }

    fn build(prefix: &str) -> Result<Self, MetricsError> {
        Ok(Self {
            operations_total: IntCounterVec::new(
                Opts::new(
                    format!("{prefix}_operations_total"),
                    "Total number of snapshot store operations",
                ),
                &["operation"],
            )?,
            operations_failed_total: IntCounterVec::new(
                Opts::new(
                    format!("{prefix}_operations_failed_total"),
                    "Total number of failed snapshot store operations",
                ),
                &["operation"],
            )?,
            operation_duration_seconds: Histogram::with_opts(HistogramOpts::new(
                format!("{prefix}_operation_duration_seconds"),
                "Duration of snapshot store operations",
            ))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_metrics_creation() {
        let registry = Registry::new();
        let metrics = StorageMetrics::new(&registry).expect("metrics");

        let initial = metrics
            .operations_total
            .with_label_values(&["replace_impact_leaderboard"])
            .get();
        assert_eq!(initial, 0);
    }
}
