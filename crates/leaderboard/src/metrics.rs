//! Prometheus metrics for leaderboard refreshes

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry};

pub struct LeaderboardMetrics {
    pub refresh_duration_seconds: HistogramVec,
    pub rows: IntGaugeVec,
    pub refresh_failures_total: IntCounterVec,
    pub skipped_wallets_total: IntCounterVec,
}

impl LeaderboardMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let metrics = Self::build("glow_leaderboard")?;

        registry.register(Box::new(metrics.refresh_duration_seconds.clone()))?;
        registry.register(Box::new(metrics.rows.clone()))?;
        registry.register(Box::new(metrics.refresh_failures_total.clone()))?;
        registry.register(Box::new(metrics.skipped_wallets_total.clone()))?;

        Ok(metrics)
    }

    /// Metrics that are not attached to any registry.
    pub fn new_unregistered() -> Result<Self, prometheus::Error> {
        Self::build("test_leaderboard")
    }

    fn build(prefix: &str) -> Result<Self, prometheus::Error> {
        Ok(Self {
            refresh_duration_seconds: HistogramVec::new(
                HistogramOpts::new(
                    format!("{prefix}_refresh_duration_seconds"),
                    "Duration of a leaderboard refresh",
                )
                .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]),
                &["board"],
            )?,
            rows: IntGaugeVec::new(
                Opts::new(format!("{prefix}_rows"), "Ranked rows in the last snapshot"),
                &["board"],
            )?,
            refresh_failures_total: IntCounterVec::new(
                Opts::new(
                    format!("{prefix}_refresh_failures_total"),
                    "Leaderboard refreshes that failed",
                ),
                &["board"],
            )?,
            skipped_wallets_total: IntCounterVec::new(
                Opts::new(
                    format!("{prefix}_skipped_wallets_total"),
                    "Wallets dropped from a refresh because scoring failed",
                ),
                &["board"],
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_once() {
        let registry = Registry::new();
        let metrics = LeaderboardMetrics::new(&registry).expect("metrics");
        metrics.rows.with_label_values(&["impact"]).set(3);
        assert!(LeaderboardMetrics::new(&registry).is_err());
        assert_eq!(metrics.rows.with_label_values(&["impact"]).get(), 3);
    }
}
