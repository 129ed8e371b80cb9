//! Leaderboard materialization.
//!
//! Scores the wallet universe in fixed-size groups against one shared range
//! snapshot, drops dust and failed wallets, ranks the rest and replaces the
//! stored snapshot in one unit.

use crate::delegators::delegator_rows;
use crate::error::{LeaderboardError, Result};
use crate::metrics::LeaderboardMetrics;
use crate::sort::rank_rows;
use crate::universe::WalletUniverse;
use crate::LeaderboardConfig;
use glow_scoring::{ScoreOptions, ScoringEngine};
use glow_storage::SnapshotStore;
use glow_types::{
    normalize_wallets, DelegatorsSnapshot, GlowImpactScoreResult, ImpactLeaderboardSnapshot,
    LeaderboardFlags, LeaderboardRow, LeaderboardSortKey, RegionTotalsRow, WalletAddress,
    WeekRange, WeeklyImpactRow,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Result of one impact build, before persistence.
#[derive(Debug, Clone)]
pub struct ImpactBuild {
    pub snapshot: ImpactLeaderboardSnapshot,
    /// Weekly breakdown per ranked wallet; empty unless requested.
    pub weekly: BTreeMap<WalletAddress, Vec<WeeklyImpactRow>>,
    /// Wallets whose scoring failed.
    pub skipped: usize,
}

/// Projects a score result into a leaderboard row. Rank is assigned later.
pub fn leaderboard_row(result: &GlowImpactScoreResult) -> LeaderboardRow {
    LeaderboardRow {
        rank: 0,
        wallet_address: result.wallet_address.clone(),
        week_range: result.week_range,
        total_points: result.totals.total_points,
        glow_worth_wei: result.glow_worth.glow_worth_wei,
        last_week_points: result.last_week_points,
        composition: result.composition.clone(),
        flags: LeaderboardFlags {
            active_multiplier: result.active_multiplier,
            has_miner_multiplier: result.has_miner_multiplier,
            has_steering_stake: result.has_steering_stake,
            has_vault_bonus: result.glow_worth.delegated_active_glw_wei > 0,
            end_week_multiplier: result.end_week_multiplier,
        },
        points_per_region: result.points_per_region.clone(),
    }
}

/// Sums points per region over `rows`.
pub fn region_totals(rows: &[LeaderboardRow]) -> RegionTotalsRow {
    let mut totals = BTreeMap::new();
    for row in rows {
        for (region, points) in &row.points_per_region {
            let entry = totals.entry(*region).or_insert(0u128);
            *entry = entry.saturating_add(*points);
        }
    }
    RegionTotalsRow {
        global_region_totals: totals,
    }
}

pub struct Materializer {
    engine: Arc<ScoringEngine>,
    universe: WalletUniverse,
    store: Arc<dyn SnapshotStore>,
    config: LeaderboardConfig,
    metrics: Option<Arc<LeaderboardMetrics>>,
}

impl Materializer {
    pub fn new(
        engine: Arc<ScoringEngine>,
        universe: WalletUniverse,
        store: Arc<dyn SnapshotStore>,
        config: LeaderboardConfig,
    ) -> Self {
        Self {
            engine,
            universe,
            store,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<LeaderboardMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn engine(&self) -> &Arc<ScoringEngine> {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    /// Default range: the configured start week through the last completed week.
    pub fn default_range(&self) -> WeekRange {
        WeekRange::through_last_completed(self.config.start_week, self.engine.clock().now_unix())
    }

    /// Eligible wallets with protocol-owned wallets removed.
    pub async fn universe(&self) -> Result<Vec<WalletAddress>> {
        let excluded: HashSet<WalletAddress> =
            normalize_wallets(&self.engine.config().excluded_wallets)
                .into_iter()
                .collect();
        self.universe.collect(&excluded).await
    }

    /// Scores the universe over `range` and ranks it by `sort`.
    pub async fn build_impact(
        &self,
        range: WeekRange,
        sort: LeaderboardSortKey,
        include_weekly: bool,
    ) -> Result<ImpactBuild> {
        let wallets = self.universe().await?;
        self.build_impact_for(&wallets, range, sort, include_weekly).await
    }

    /// Like [`Materializer::build_impact`] over an explicit wallet list.
    pub async fn build_impact_for(
        &self,
        wallets: &[WalletAddress],
        range: WeekRange,
        sort: LeaderboardSortKey,
        include_weekly: bool,
    ) -> Result<ImpactBuild> {
        let options = ScoreOptions { include_weekly };
        let mut rows = Vec::new();
        let mut weekly = BTreeMap::new();
        let mut skipped = 0usize;
        let mut dust = 0usize;

        let shared = self.engine.load_range(range).await;
        for (group_index, group) in wallets.chunks(self.config.group_size.max(1)).enumerate() {
            let scores = self.engine.score_group(&shared, group, options).await;
            for (wallet, result) in scores {
                match result {
                    Ok(result) if result.totals.total_points < self.config.dust_threshold_points => {
                        dust += 1;
                    }
                    Ok(mut result) => {
                        rows.push(leaderboard_row(&result));
                        if include_weekly {
                            weekly.insert(wallet, std::mem::take(&mut result.weekly));
                        }
                    }
                    Err(e) => {
                        warn!(wallet = %wallet, error = %e, "skipping wallet");
                        skipped += 1;
                    }
                }
            }
            info!(
                group = group_index,
                scored = rows.len(),
                skipped,
                dust,
                "leaderboard group complete"
            );
        }

        if skipped > 0 {
            if let Some(metrics) = &self.metrics {
                metrics
                    .skipped_wallets_total
                    .with_label_values(&["impact"])
                    .inc_by(skipped as u64);
            }
        }

        rank_rows(&mut rows, sort);
        let totals = region_totals(&rows);
        Ok(ImpactBuild {
            snapshot: ImpactLeaderboardSnapshot {
                week_range: range,
                rows,
                region_totals: totals,
                computed_at: self.engine.clock().now_unix(),
            },
            weekly,
            skipped,
        })
    }

    /// Rebuilds the default-range impact leaderboard and replaces the stored snapshot.
    pub async fn refresh_impact(&self) -> Result<ImpactLeaderboardSnapshot> {
        let range = self.default_range();
        let started = Instant::now();
        let outcome = async {
            let build = self
                .build_impact(range, LeaderboardSortKey::TotalPoints, false)
                .await?;
            self.store.replace_impact_leaderboard(&build.snapshot).await?;
            Ok::<_, LeaderboardError>(build.snapshot)
        }
        .await;
        self.record_refresh("impact", started, outcome.as_ref().map(|s| s.rows.len()));

        if let Ok(snapshot) = &outcome {
            info!(
                rows = snapshot.rows.len(),
                start_week = range.start_week,
                end_week = range.end_week,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "impact leaderboard refreshed"
            );
        }
        outcome
    }

    /// Computes the delegators leaderboard over `range`.
    pub async fn build_delegators(&self, range: WeekRange) -> Result<DelegatorsSnapshot> {
        let wallets = self.universe().await?;
        let mut summaries = Vec::with_capacity(wallets.len());
        let mut skipped = 0usize;
        let shared = self.engine.snapshot_without_steering(range);
        for group in wallets.chunks(self.config.group_size.max(1)) {
            for (wallet, result) in self.engine.delegation_group(&shared, group).await {
                match result {
                    Ok(summary) => summaries.push(summary),
                    Err(e) => {
                        warn!(wallet = %wallet, error = %e, "skipping delegator");
                        skipped += 1;
                    }
                }
            }
        }
        if skipped > 0 {
            if let Some(metrics) = &self.metrics {
                metrics
                    .skipped_wallets_total
                    .with_label_values(&["delegators"])
                    .inc_by(skipped as u64);
            }
        }

        Ok(DelegatorsSnapshot {
            week_range: range,
            rows: delegator_rows(&summaries, range),
            computed_at: self.engine.clock().now_unix(),
        })
    }

    /// Rebuilds the default-range delegators leaderboard and replaces the stored snapshot.
    pub async fn refresh_delegators(&self) -> Result<DelegatorsSnapshot> {
        let range = self.default_range();
        let started = Instant::now();
        let outcome = async {
            let snapshot = self.build_delegators(range).await?;
            self.store.replace_delegators_leaderboard(&snapshot).await?;
            Ok::<_, LeaderboardError>(snapshot)
        }
        .await;
        self.record_refresh("delegators", started, outcome.as_ref().map(|s| s.rows.len()));

        if let Ok(snapshot) = &outcome {
            info!(
                rows = snapshot.rows.len(),
                end_week = range.end_week,
                "delegators leaderboard refreshed"
            );
        }
        outcome
    }

    fn record_refresh<E>(&self, board: &str, started: Instant, outcome: std::result::Result<usize, E>) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        metrics
            .refresh_duration_seconds
            .with_label_values(&[board])
            .observe(started.elapsed().as_secs_f64());
        match outcome {
            Ok(rows) => metrics.rows.with_label_values(&[board]).set(rows as i64),
            Err(_) => metrics.refresh_failures_total.with_label_values(&[board]).inc(),
        }
    }
}
