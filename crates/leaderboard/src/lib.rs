//! Impact and delegators leaderboards.
//!
//! - [`Materializer`]: scores the wallet universe in groups, ranks it and
//!   replaces the stored snapshot in one transaction
//! - [`LeaderboardService`]: read path with an in-process TTL cache in front
//!   of the stored snapshot
//! - [`SteeringSync`]: warms the steering snapshot cache ahead of a refresh

mod delegators;
mod error;
mod materializer;
mod metrics;
mod service;
mod sort;
mod sync;
mod universe;

use glow_primitives::{Week, FIRST_V2_WEEK};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use delegators::delegator_rows;
pub use error::{LeaderboardError, Result};
pub use materializer::{leaderboard_row, region_totals, ImpactBuild, Materializer};
pub use metrics::LeaderboardMetrics;
pub use service::{LeaderboardPage, LeaderboardQuery, LeaderboardService};
pub use sort::{rank_rows, sort_value};
pub use sync::{SteeringSync, SyncReport};
pub use universe::WalletUniverse;

/// Leaderboard materialization and serving settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Wallets handed to the scoring engine per group
    #[serde(default = "default_group_size")]
    pub group_size: usize,

    /// Rows below this many scaled6 points are dropped (0.01 points)
    #[serde(default = "default_dust_threshold_points")]
    pub dust_threshold_points: u128,

    /// First week of the default range
    #[serde(default = "default_start_week")]
    pub start_week: Week,

    /// Lifetime of cached leaderboard pages
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub cache_ttl: Duration,

    /// Rows returned when a query sets no limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default)]
    pub steering_sync: SteeringSyncConfig,
}

/// Steering warm-sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteeringSyncConfig {
    /// Completed weeks re-checked on every sync
    #[serde(default = "default_lookback_weeks")]
    pub lookback_weeks: u32,

    /// Epochs of region rewards fetched at once
    #[serde(default = "default_region_concurrency")]
    pub region_concurrency: usize,

    /// Wallet stake histories fetched at once
    #[serde(default = "default_wallet_concurrency")]
    pub wallet_concurrency: usize,
}

fn default_group_size() -> usize {
    200
}

fn default_dust_threshold_points() -> u128 {
    10_000
}

fn default_start_week() -> Week {
    FIRST_V2_WEEK
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(600)
}

fn default_limit() -> usize {
    100
}

fn default_lookback_weeks() -> u32 {
    5
}

fn default_region_concurrency() -> usize {
    3
}

fn default_wallet_concurrency() -> usize {
    8
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            group_size: default_group_size(),
            dust_threshold_points: default_dust_threshold_points(),
            start_week: default_start_week(),
            cache_ttl: default_cache_ttl(),
            default_limit: default_limit(),
            steering_sync: SteeringSyncConfig::default(),
        }
    }
}

impl Default for SteeringSyncConfig {
    fn default() -> Self {
        Self {
            lookback_weeks: default_lookback_weeks(),
            region_concurrency: default_region_concurrency(),
            wallet_concurrency: default_wallet_concurrency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LeaderboardConfig::default();
        assert_eq!(config.dust_threshold_points, 10_000);
        assert_eq!(config.start_week, 97);
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.steering_sync.lookback_weeks, 5);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: LeaderboardConfig =
            serde_json::from_str(r#"{"group_size": 50, "cache_ttl": "2m"}"#).expect("parse");
        assert_eq!(config.group_size, 50);
        assert_eq!(config.cache_ttl, Duration::from_secs(120));
        assert_eq!(config.default_limit, 100);
        assert_eq!(config.steering_sync.region_concurrency, 3);
    }
}
