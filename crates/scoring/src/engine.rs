//! Batch scoring engine.
//!
//! Range-level data (region rewards, foundation stakes, the week clock) is
//! loaded once per run into a [`RangeSnapshot`]. Ledger data (reward rows,
//! split history, farm vaults) is fetched once per wallet group, and
//! per-wallet data with bounded concurrency. Every fetch is time-limited and
//! degrades to a fallback value plus a warning instead of failing the wallet.
//! Wallets caught in a failed upstream batch get the warning too.

use crate::compute::{score_wallet, ScoreContext, WalletInputs, STREAK_LOOKBACK_WEEKS};
use crate::delegation::{summarize_delegation, DelegationSummary};
use crate::error::{Result, ScoringError};
use crate::metrics::ScoringMetrics;
use crate::projection::project_current_week;
use crate::sources::{
    BalanceSnapshotStore, Batched, ClaimsSource, LiquidBalanceSource, PurchaseSource, RewardLedgerSource,
    SourceError, SteeringSnapshotCache, SteeringSource,
};
use crate::steering::{
    foundation_stakes, normalize_foundation_wallets, saturated_regions, FoundationStakes,
    RegionRewardsByWeek, SteeringLoader,
};
use futures::stream::{self, StreamExt};
use glow_ledger::{PurchaseLedger, ReconcilerConfig, VaultLedger};
use glow_primitives::{
    current_week, last_completed_week, week_end_timestamp, Clock, Week, WeekRange, FIRST_V2_WEEK,
};
use glow_types::{
    normalize_wallets, CurrentWeekProjection, DepositSplitSegment, FarmId, GlowImpactScoreResult,
    ScoreWarnings, WalletAddress, WalletRewardRow,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Wallets scored concurrently.
    #[serde(default = "default_wallet_concurrency")]
    pub wallet_concurrency: usize,

    /// Concurrent per-epoch region reward fetches.
    #[serde(default = "default_region_concurrency")]
    pub region_concurrency: usize,

    /// Limit on any single upstream fetch.
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: Duration,

    /// Protocol-owned wallets: scored, then zeroed.
    #[serde(default)]
    pub excluded_wallets: Vec<String>,

    /// Foundation wallets whose stake boosts everyone else's steering.
    #[serde(default)]
    pub foundation_wallets: Vec<String>,

    /// Claim matching parameters.
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Overrides the last week with settled distributions.
    #[serde(default)]
    pub finalized_week_override: Option<Week>,
}

fn default_wallet_concurrency() -> usize {
    8
}

fn default_region_concurrency() -> usize {
    3
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            wallet_concurrency: default_wallet_concurrency(),
            region_concurrency: default_region_concurrency(),
            fetch_timeout: default_fetch_timeout(),
            excluded_wallets: Vec::new(),
            foundation_wallets: Vec::new(),
            reconciler: ReconcilerConfig::default(),
            finalized_week_override: None,
        }
    }
}

/// Per-request options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreOptions {
    /// Keep per-week rows in each result.
    pub include_weekly: bool,
}

/// Collaborators the engine reads from.
#[derive(Clone)]
pub struct ScoringSources {
    pub rewards: Arc<dyn RewardLedgerSource>,
    pub claims: Arc<dyn ClaimsSource>,
    pub liquid: Arc<dyn LiquidBalanceSource>,
    pub balances: Arc<dyn BalanceSnapshotStore>,
    pub steering: Arc<dyn SteeringSource>,
    pub steering_cache: Option<Arc<dyn SteeringSnapshotCache>>,
    pub purchases: Arc<dyn PurchaseSource>,
}

/// One wallet's outcome in a batch.
pub type WalletScore = (WalletAddress, Result<GlowImpactScoreResult>);

/// One wallet's delegation outcome in a batch.
pub type WalletDelegation = (WalletAddress, Result<DelegationSummary>);


/// Range-level data shared by every wallet group scored over one range.
///
/// Loaded once per run with [`ScoringEngine::load_range`] so that all groups
/// see the same week clock, region rewards and foundation stakes.
pub struct RangeSnapshot {
    range: WeekRange,
    current_week: Week,
    finalized_week: Week,
    region_rewards: RegionRewardsByWeek,
    foundation: FoundationStakes,
    warnings: ScoreWarnings,
}

impl RangeSnapshot {
    pub fn range(&self) -> WeekRange {
        self.range
    }

    /// Week in progress when the snapshot was taken.
    pub fn current_week(&self) -> Week {
        self.current_week
    }

    /// Range-wide degradation, copied into every wallet's warnings.
    pub fn warnings(&self) -> &ScoreWarnings {
        &self.warnings
    }
}

/// Per-group ledger data on top of a [`RangeSnapshot`].
struct GroupData<'a> {
    shared: &'a RangeSnapshot,
    vaults: VaultLedger,
    rewards: HashMap<WalletAddress, Vec<WalletRewardRow>>,
    splits: HashMap<WalletAddress, Vec<DepositSplitSegment>>,
    failed_rewards: HashSet<WalletAddress>,
    failed_splits: HashSet<WalletAddress>,
    failed_farms: HashSet<FarmId>,
    warnings: ScoreWarnings,
}

pub struct ScoringEngine {
    sources: ScoringSources,
    config: ScoringConfig,
    clock: Arc<dyn Clock>,
    steering: SteeringLoader,
    excluded: HashSet<WalletAddress>,
    foundation: Vec<WalletAddress>,
    metrics: Option<Arc<ScoringMetrics>>,
}

impl ScoringEngine {
    pub fn new(sources: ScoringSources, config: ScoringConfig, clock: Arc<dyn Clock>) -> Self {
        let steering = SteeringLoader::new(
            sources.steering.clone(),
            sources.steering_cache.clone(),
            config.region_concurrency,
        );
        let excluded = normalize_wallets(&config.excluded_wallets).into_iter().collect();
        let foundation = normalize_foundation_wallets(&config.foundation_wallets);
        Self {
            sources,
            config,
            clock,
            steering,
            excluded,
            foundation,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ScoringMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Protocol-owned wallets.
    pub fn is_excluded(&self, wallet: &WalletAddress) -> bool {
        self.excluded.contains(wallet)
    }

    /// Week in progress.
    pub fn current_week(&self) -> Week {
        current_week(self.clock.now_unix())
    }

    /// Default impact range: first v2 week through the last completed week.
    pub fn default_range(&self) -> WeekRange {
        WeekRange::through_last_completed(FIRST_V2_WEEK, self.clock.now_unix())
    }

    fn finalized_week(&self) -> Week {
        self.config
            .finalized_week_override
            .unwrap_or_else(|| last_completed_week(self.clock.now_unix()))
    }


    /// Scores a single wallet. Fails only when the computation itself fails.
    pub async fn compute_score(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
        options: ScoreOptions,
    ) -> Result<GlowImpactScoreResult> {
        let mut results = self
            .compute_scores(std::slice::from_ref(wallet), range, options)
            .await;
        match results.pop() {
            Some((_, result)) => result,
            None => Err(ScoringError::Source(SourceError::Unavailable(format!(
                "no result for wallet {wallet}"
            )))),
        }
    }

    /// Scores `wallets` over `range`, one result per wallet.
    ///
    /// A failing wallet never aborts the batch. Results come back in input order.
    pub async fn compute_scores(
        &self,
        wallets: &[WalletAddress],
        range: WeekRange,
        options: ScoreOptions,
    ) -> Vec<WalletScore> {
        if wallets.is_empty() {
            return Vec::new();
        }
        let snapshot = self.load_range(range).await;
        self.score_group(&snapshot, wallets, options).await
    }

    /// Loads the range-level data for scoring `range`.
    pub async fn load_range(&self, range: WeekRange) -> RangeSnapshot {
        let mut snapshot = self.snapshot_without_steering(range);
        let scan_range = range.with_lookback(STREAK_LOOKBACK_WEEKS);

        match self
            .timed("steering", self.steering.region_rewards(scan_range))
            .await
        {
            Ok((region_rewards, warning)) => {
                snapshot.region_rewards = region_rewards;
                snapshot.warnings.steering = warning;
            }
            Err(e) => {
                warn!(error = %e, "region rewards unavailable, steering zeroed");
                snapshot.warnings.steering = Some(format!("region rewards unavailable: {e}"));
            }
        }
        if snapshot.warnings.steering.is_some() {
            if let Some(metrics) = &self.metrics {
                metrics.record_degraded("steering");
            }
        }

        let mut foundation_history = Vec::with_capacity(self.foundation.len());
        for wallet in &self.foundation {
            let loaded = self.steering.wallet_stakes(wallet, scan_range).await;
            if let Some(warning) = loaded.warning {
                debug!(wallet = %wallet, warning, "foundation stake degraded");
            }
            foundation_history.push(loaded.by_week);
        }
        snapshot.foundation = foundation_stakes(foundation_history.iter());

        for (week, region_id) in saturated_regions(&snapshot.region_rewards, &snapshot.foundation) {
            warn!(week, region_id, "foundation stake covers the whole region, boost clamped to 1.0x");
        }
        snapshot
    }

    /// Range snapshot with no steering data, for vault-only figures.
    pub fn snapshot_without_steering(&self, range: WeekRange) -> RangeSnapshot {
        RangeSnapshot {
            range,
            current_week: self.current_week(),
            finalized_week: self.finalized_week(),
            region_rewards: RegionRewardsByWeek::new(),
            foundation: FoundationStakes::default(),
            warnings: ScoreWarnings::default(),
        }
    }

    /// Scores one group of wallets against a shared range snapshot.
    pub async fn score_group(
        &self,
        snapshot: &RangeSnapshot,
        wallets: &[WalletAddress],
        options: ScoreOptions,
    ) -> Vec<WalletScore> {
        if wallets.is_empty() {
            return Vec::new();
        }
        let group = self.load_group(snapshot, wallets).await;
        info!(
            wallets = wallets.len(),
            start_week = snapshot.range.start_week,
            end_week = snapshot.range.end_week,
            split_segments = group.splits.values().map(Vec::len).sum::<usize>(),
            "scoring batch"
        );

        let group = &group;
        let mut results: Vec<(usize, WalletScore)> = stream::iter(wallets.iter().cloned().enumerate())
            .map(|(index, wallet)| async move {
                let result = self.score_one(group, wallet.clone(), options).await;
                (index, (wallet, result))
            })
            .buffer_unordered(self.config.wallet_concurrency.max(1))
            .collect()
            .await;
        results.sort_by_key(|(index, _)| *index);

        let results: Vec<WalletScore> = results.into_iter().map(|(_, r)| r).collect();
        if let Some(metrics) = &self.metrics {
            metrics.wallets_total.inc_by(results.len() as u64);
            let failures = results.iter().filter(|(_, r)| r.is_err()).count();
            metrics.wallet_failures_total.inc_by(failures as u64);
        }
        results
    }

    /// Delegation figures for `wallets` over `range`, in input order.
    ///
    /// Only reward rows, split history, farm vaults and purchases are read.
    pub async fn compute_delegations(
        &self,
        wallets: &[WalletAddress],
        range: WeekRange,
    ) -> Vec<WalletDelegation> {
        let snapshot = self.snapshot_without_steering(range);
        self.delegation_group(&snapshot, wallets).await
    }

    /// Delegation figures for one group of wallets against a shared snapshot.
    pub async fn delegation_group(
        &self,
        snapshot: &RangeSnapshot,
        wallets: &[WalletAddress],
    ) -> Vec<WalletDelegation> {
        if wallets.is_empty() {
            return Vec::new();
        }
        let group = self.load_group(snapshot, wallets).await;
        info!(
            wallets = wallets.len(),
            start_week = snapshot.range.start_week,
            end_week = snapshot.range.end_week,
            "summarizing delegations"
        );

        let group = &group;
        let mut results: Vec<(usize, WalletDelegation)> =
            stream::iter(wallets.iter().cloned().enumerate())
                .map(|(index, wallet)| async move {
                    let inputs = self.delegation_inputs(group, wallet.clone()).await;
                    let ctx = group.context(&self.config.reconciler, false);
                    let result = summarize_delegation(&ctx, &inputs);
                    if let Err(e) = &result {
                        warn!(wallet = %wallet, error = %e, "delegation summary failed");
                    }
                    (index, (wallet, result))
                })
                .buffer_unordered(self.config.wallet_concurrency.max(1))
                .collect()
                .await;
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, r)| r).collect()
    }

    /// Projects the in-progress week for one wallet.
    pub async fn project_current_week(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<CurrentWeekProjection> {
        let snapshot = self.load_range(range).await;
        let group = self.load_group(&snapshot, std::slice::from_ref(wallet)).await;
        let inputs = self.wallet_inputs(&group, wallet.clone()).await;

        let stakes = self
            .timed("steering", self.sources.steering.current_wallet_stake(wallet))
            .await
            .unwrap_or_else(|e| {
                warn!(wallet = %wallet, error = %e, "current stake unavailable");
                Vec::new()
            });
        let regions = self
            .timed("steering", self.sources.steering.current_region_rewards())
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "current region rewards unavailable");
                Vec::new()
            });

        project_current_week(&group.context(&self.config.reconciler, false), &inputs, &stakes, &regions)
    }

    async fn score_one(
        &self,
        group: &GroupData<'_>,
        wallet: WalletAddress,
        options: ScoreOptions,
    ) -> Result<GlowImpactScoreResult> {
        let inputs = self.wallet_inputs(group, wallet.clone()).await;
        let ctx = group.context(&self.config.reconciler, options.include_weekly);
        let result = score_wallet(&ctx, inputs);
        if let Err(e) = &result {
            warn!(wallet = %wallet, error = %e, "wallet scoring failed");
        }
        result
    }

    /// Reward rows must cover every week the reconciler may look at.
    fn ledger_range(range: WeekRange, current_week: Week) -> WeekRange {
        WeekRange {
            start_week: range
                .with_lookback(STREAK_LOOKBACK_WEEKS + 1)
                .start_week
                .min(FIRST_V2_WEEK),
            end_week: range.end_week.max(current_week),
        }
    }

    async fn load_group<'a>(
        &self,
        snapshot: &'a RangeSnapshot,
        wallets: &[WalletAddress],
    ) -> GroupData<'a> {
        let ledger_range = Self::ledger_range(snapshot.range, snapshot.current_week);
        let mut warnings = snapshot.warnings.clone();

        let rewards = self
            .timed("rewards", self.sources.rewards.wallet_rewards(wallets, ledger_range))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "wallet rewards unavailable, scoring without rewards");
                warnings.rewards = Some(format!("rewards unavailable: {e}"));
                self.record_degraded("rewards");
                Batched::default()
            });
        if !rewards.is_complete() {
            warn!(wallets = rewards.failed.len(), "reward batches failed for some wallets");
            self.record_degraded("rewards");
        }

        let splits = self
            .timed("vault", self.sources.rewards.deposit_splits(wallets))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "deposit splits unavailable, vault positions empty");
                warnings.vault = Some(format!("deposit splits unavailable: {e}"));
                self.record_degraded("vault");
                Batched::default()
            });
        if !splits.is_complete() {
            warn!(wallets = splits.failed.len(), "split batches failed for some wallets");
            self.record_degraded("vault");
        }

        let farm_ids: Vec<FarmId> = splits
            .values
            .values()
            .flatten()
            .map(|s| s.farm_id.clone())
            .chain(rewards.values.values().flatten().filter_map(|r| r.farm_id.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let (vaults, failed_farms) = self
            .load_vaults(&farm_ids, ledger_range.end_week, snapshot.finalized_week, &mut warnings)
            .await;

        GroupData {
            shared: snapshot,
            vaults,
            rewards: rewards.values,
            splits: splits.values,
            failed_rewards: rewards.failed,
            failed_splits: splits.failed,
            failed_farms,
            warnings,
        }
    }

    async fn load_vaults(
        &self,
        farm_ids: &[FarmId],
        through_week: Week,
        finalized_week: Week,
        warnings: &mut ScoreWarnings,
    ) -> (VaultLedger, HashSet<FarmId>) {
        if farm_ids.is_empty() {
            return (VaultLedger::new(finalized_week), HashSet::new());
        }

        let principals = self
            .timed("vault", self.sources.purchases.farm_principals(farm_ids))
            .await;
        let distributions = self
            .timed(
                "vault",
                self.sources
                    .rewards
                    .farm_distributions(farm_ids, WeekRange { start_week: 0, end_week: through_week }),
            )
            .await;

        match (principals, distributions) {
            (Ok(principals), Ok(distributions)) => {
                if !distributions.is_complete() {
                    warn!(farms = distributions.failed.len(), "distribution batches failed for some farms");
                    self.record_degraded("vault");
                }
                let rows: Vec<_> = distributions.values.into_values().flatten().collect();
                (
                    VaultLedger::from_parts(&principals, &rows, finalized_week),
                    distributions.failed,
                )
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, farms = farm_ids.len(), "farm vault data unavailable");
                warnings.vault = Some(format!("farm vault data unavailable: {e}"));
                self.record_degraded("vault");
                (VaultLedger::new(finalized_week), HashSet::new())
            }
        }
    }

    async fn wallet_inputs(&self, group: &GroupData<'_>, wallet: WalletAddress) -> WalletInputs {
        let mut inputs = WalletInputs::empty(wallet.clone());
        inputs.warnings = group.wallet_warnings(&wallet);
        inputs.excluded = self.is_excluded(&wallet);
        inputs.rewards = group.rewards.get(&wallet).cloned().unwrap_or_default();
        inputs.splits = group.splits.get(&wallet).cloned().unwrap_or_default();

        let range = group.shared.range;
        let until = week_end_timestamp(group.shared.current_week);
        let scan_range = range.with_lookback(STREAK_LOOKBACK_WEEKS);
        let (claims, live, balances, stakes, purchases, refunds) = tokio::join!(
            self.timed("claims", self.sources.claims.claims(&wallet)),
            self.timed("liquid", self.sources.liquid.live_balance(&wallet)),
            self.timed("liquid", self.sources.balances.weekly_balances(&wallet, range)),
            self.timed("steering", async { Ok(self.steering.wallet_stakes(&wallet, scan_range).await) }),
            self.timed("purchases", self.sources.purchases.purchases(&wallet, until)),
            self.timed("purchases", self.sources.purchases.refunds(&wallet, until)),
        );

        match claims {
            Ok(snapshot) => inputs.claims = Some(snapshot),
            Err(e) => {
                self.degraded(&wallet, "claims", &e);
                inputs.warnings.unclaimed = Some(match e {
                    SourceError::IndexingIncomplete => "claims indexer is still indexing".to_string(),
                    other => format!("claims unavailable: {other}"),
                });
            }
        }

        match live {
            Ok(balance) => inputs.live_balance_wei = balance,
            Err(e) => {
                self.degraded(&wallet, "liquid", &e);
                inputs.warnings.liquid = Some(format!("live balance unavailable: {e}"));
            }
        }

        match balances {
            Ok(balances) => inputs.balances = balances,
            Err(e) => {
                self.degraded(&wallet, "liquid", &e);
                inputs
                    .warnings
                    .liquid
                    .get_or_insert_with(|| format!("balance snapshots unavailable: {e}"));
            }
        }

        match stakes {
            Ok(loaded) => {
                if let Some(warning) = loaded.warning {
                    self.record_degraded("steering");
                    inputs.warnings.steering = Some(warning);
                }
                inputs.stakes = loaded.by_week;
            }
            Err(e) => {
                self.degraded(&wallet, "steering", &e);
                inputs.warnings.steering = Some(format!("steering unavailable: {e}"));
            }
        }

        match (purchases, refunds) {
            (Ok(purchases), Ok(refunds)) => {
                inputs.purchases = PurchaseLedger::from_records(&purchases, &refunds);
            }
            (Err(e), _) | (_, Err(e)) => {
                self.degraded(&wallet, "purchases", &e);
                inputs.warnings.purchases = Some(format!("purchases unavailable: {e}"));
            }
        }

        inputs
    }

    async fn delegation_inputs(&self, group: &GroupData<'_>, wallet: WalletAddress) -> WalletInputs {
        let mut inputs = WalletInputs::empty(wallet.clone());
        inputs.warnings = group.wallet_warnings(&wallet);
        inputs.excluded = self.is_excluded(&wallet);
        inputs.rewards = group.rewards.get(&wallet).cloned().unwrap_or_default();
        inputs.splits = group.splits.get(&wallet).cloned().unwrap_or_default();

        let until = week_end_timestamp(group.shared.range.end_week);
        let (purchases, refunds) = tokio::join!(
            self.timed("purchases", self.sources.purchases.purchases(&wallet, until)),
            self.timed("purchases", self.sources.purchases.refunds(&wallet, until)),
        );
        match (purchases, refunds) {
            (Ok(purchases), Ok(refunds)) => {
                inputs.purchases = PurchaseLedger::from_records(&purchases, &refunds);
            }
            (Err(e), _) | (_, Err(e)) => {
                self.degraded(&wallet, "purchases", &e);
                inputs.warnings.purchases = Some(format!("purchases unavailable: {e}"));
            }
        }
        inputs
    }

    fn record_degraded(&self, source: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_degraded(source);
        }
    }

    fn degraded(&self, wallet: &WalletAddress, source: &str, error: &SourceError) {
        warn!(wallet = %wallet, source, error = %error, "fetch failed, using fallback");
        self.record_degraded(source);
    }

    async fn timed<T, F>(&self, source: &'static str, fut: F) -> std::result::Result<T, SourceError>
    where
        F: Future<Output = std::result::Result<T, SourceError>>,
    {
        match tokio::time::timeout(self.config.fetch_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                debug!(source, timeout = ?self.config.fetch_timeout, "fetch timed out");
                Err(SourceError::Timeout(self.config.fetch_timeout))
            }
        }
    }
}


impl GroupData<'_> {
    fn context<'a>(&'a self, reconciler: &'a ReconcilerConfig, include_weekly: bool) -> ScoreContext<'a> {
        ScoreContext {
            range: self.shared.range,
            current_week: self.shared.current_week,
            vaults: &self.vaults,
            region_rewards: &self.shared.region_rewards,
            foundation: &self.shared.foundation,
            reconciler,
            include_weekly,
        }
    }

    /// Group warnings plus this wallet's share of any partial batch failure.
    fn wallet_warnings(&self, wallet: &WalletAddress) -> ScoreWarnings {
        let mut warnings = self.warnings.clone();
        if self.failed_rewards.contains(wallet) {
            warnings
                .rewards
                .get_or_insert_with(|| "reward batch failed, rewards missing".to_string());
        }
        if self.failed_splits.contains(wallet) {
            warnings
                .vault
                .get_or_insert_with(|| "split batch failed, vault position missing".to_string());
        }
        if !self.failed_farms.is_empty() {
            let farm = self
                .splits
                .get(wallet)
                .into_iter()
                .flatten()
                .map(|s| &s.farm_id)
                .chain(
                    self.rewards
                        .get(wallet)
                        .into_iter()
                        .flatten()
                        .filter_map(|r| r.farm_id.as_ref()),
                )
                .find(|farm| self.failed_farms.contains(*farm));
            if let Some(farm) = farm {
                warnings
                    .vault
                    .get_or_insert_with(|| format!("distributions unavailable for farm {farm}"));
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: ScoringConfig = serde_json::from_str("{}").expect("defaults");
        assert_eq!(config.wallet_concurrency, 8);
        assert_eq!(config.region_concurrency, 3);
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.reconciler.inflation_lag_weeks, 3);
        assert!(config.finalized_week_override.is_none());
    }

    #[test]
    fn test_config_humantime_timeout() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"fetch_timeout": "5s", "excluded_wallets": ["0xabc"]}"#)
                .expect("config");
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.excluded_wallets.len(), 1);
    }

    #[test]
    fn test_ledger_range_covers_v2_history_and_now() {
        let range = WeekRange::new(120, 130).expect("range");
        let ledger = ScoringEngine::ledger_range(range, 140);
        assert_eq!(ledger.start_week, FIRST_V2_WEEK);
        assert_eq!(ledger.end_week, 140);
    }
}
