//! Prometheus metrics for the scoring engine

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

pub struct ScoringMetrics {
    pub wallets_total: IntCounter,
    pub wallet_failures_total: IntCounter,
    pub degraded_total: IntCounterVec,
}

impl ScoringMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let metrics = Self::build("glow_scoring")?;

        registry.register(Box::new(metrics.wallets_total.clone()))?;
        registry.register(Box::new(metrics.wallet_failures_total.clone()))?;
        registry.register(Box::new(metrics.degraded_total.clone()))?;

        Ok(metrics)
    }

    /// Metrics that are not attached to any registry.
    pub fn new_unregistered() -> Result<Self, prometheus::Error> {
        Self::build("test_scoring")
    }

    fn build(prefix: &str) -> Result<Self, prometheus::Error> {
        Ok(Self {
            wallets_total: IntCounter::with_opts(Opts::new(
                format!("{prefix}_wallets_total"),
                "Total number of wallets scored",
            ))?,
            wallet_failures_total: IntCounter::with_opts(Opts::new(
                format!("{prefix}_wallet_failures_total"),
                "Total number of wallets whose score could not be computed",
            ))?,
            degraded_total: IntCounterVec::new(
                Opts::new(
                    format!("{prefix}_degraded_total"),
                    "Total number of scores computed with a fallback value",
                ),
                &["source"],
            )?,
        })
    }

    pub(crate) fn record_degraded(&self, source: &str) {
        self.degraded_total.with_label_values(&[source]).inc();
    }
}
