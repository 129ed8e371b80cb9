//! Steering warm sync.
//!
//! Pulls the last few completed epochs of region rewards and the stake
//! histories of foundation wallets and current stakers into the snapshot
//! cache, so refreshes read steering from the database instead of the
//! Control API.

use crate::error::{LeaderboardError, Result};
use crate::SteeringSyncConfig;
use futures::stream::{self, StreamExt};
use glow_primitives::{last_completed_week, Clock};
use glow_scoring::{
    SteeringLoader, SteeringSnapshotCache, SteeringSource, WalletUniverseSource,
};
use glow_types::{normalize_wallets, WalletAddress, WeekRange};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub week_range: WeekRange,
    pub region_weeks: usize,
    pub wallets: usize,
    /// Wallets whose history fell back to the current stake or to nothing.
    pub degraded_wallets: usize,
    pub warnings: Vec<String>,
}

pub struct SteeringSync {
    loader: SteeringLoader,
    stakers: Option<Arc<dyn WalletUniverseSource>>,
    foundation: Vec<WalletAddress>,
    clock: Arc<dyn Clock>,
    config: SteeringSyncConfig,
}

impl SteeringSync {
    pub fn new(
        source: Arc<dyn SteeringSource>,
        cache: Arc<dyn SteeringSnapshotCache>,
        foundation_wallets: &[String],
        clock: Arc<dyn Clock>,
        config: SteeringSyncConfig,
    ) -> Self {
        Self {
            loader: SteeringLoader::new(source, Some(cache), config.region_concurrency),
            stakers: None,
            foundation: normalize_wallets(foundation_wallets),
            clock,
            config,
        }
    }

    /// Also syncs every wallet reported by `stakers`.
    pub fn with_stakers(mut self, stakers: Arc<dyn WalletUniverseSource>) -> Self {
        self.stakers = Some(stakers);
        self
    }

    /// The last `lookback_weeks` completed weeks.
    pub fn sync_range(&self) -> WeekRange {
        let end_week = last_completed_week(self.clock.now_unix());
        let lookback = self.config.lookback_weeks.max(1) - 1;
        WeekRange {
            start_week: end_week.saturating_sub(lookback),
            end_week,
        }
    }

    /// Fills cache gaps over [`SteeringSync::sync_range`].
    ///
    /// Fails only when region rewards could not be loaded at all; wallet
    /// failures are counted in the report.
    pub async fn run(&self) -> Result<SyncReport> {
        let started = Instant::now();
        let range = self.sync_range();
        let mut warnings = Vec::new();

        let (regions, region_warning) = self
            .loader
            .region_rewards(range)
            .await
            .map_err(LeaderboardError::Steering)?;
        warnings.extend(region_warning);

        let wallets = self.wallets(&mut warnings).await;
        let degraded_wallets = stream::iter(wallets.iter())
            .map(|wallet| async move { self.loader.wallet_stakes(wallet, range).await })
            .buffer_unordered(self.config.wallet_concurrency.max(1))
            .filter(|loaded| futures::future::ready(loaded.warning.is_some()))
            .count()
            .await;

        let report = SyncReport {
            week_range: range,
            region_weeks: regions.len(),
            wallets: wallets.len(),
            degraded_wallets,
            warnings,
        };
        info!(
            start_week = range.start_week,
            end_week = range.end_week,
            region_weeks = report.region_weeks,
            wallets = report.wallets,
            degraded = report.degraded_wallets,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "steering sync complete"
        );
        Ok(report)
    }

    async fn wallets(&self, warnings: &mut Vec<String>) -> Vec<WalletAddress> {
        let mut raw: Vec<String> = self.foundation.iter().map(|w| w.to_string()).collect();
        if let Some(stakers) = &self.stakers {
            match stakers.universe_wallets().await {
                Ok(wallets) => raw.extend(wallets),
                Err(e) => {
                    warn!(feed = stakers.feed_name(), error = %e, "staker list unavailable, syncing foundation only");
                    warnings.push(format!("stakers unavailable: {e}"));
                }
            }
        }
        normalize_wallets(raw)
    }
}
