//! Collaborator interfaces consumed by the engine.
//!
//! HTTP implementations live in `glow-control-client`, database-backed ones in
//! `glow-storage`, and in-memory mocks in `glow-simulation`.

use async_trait::async_trait;
use glow_types::{
    BalanceSnapshot, ClaimsSnapshot, DepositSplitSegment, FarmDistributionRow, FarmId,
    FarmPrincipal, PurchaseRecord, RefundRecord, RegionRewardSnapshot, WalletAddress,
    WalletRegionStake, WalletRewardRow, Week, WeekRange,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by a data source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Upstream returned an error or could not be reached.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// Upstream answered with something that could not be decoded.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    /// The claims indexer has not caught up yet.
    #[error("claims indexer is still indexing")]
    IndexingIncomplete,

    /// A required endpoint is not configured.
    #[error("configuration error: {0}")]
    Config(String),

    /// Fetch exceeded the configured timeout.
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Per-key values from a batched upstream fetch.
///
/// Keys in `failed` belonged to a batch that failed. Their absence from
/// `values` means unknown, not empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batched<K: Eq + Hash, T> {
    pub values: HashMap<K, T>,
    pub failed: HashSet<K>,
}

impl<K: Eq + Hash, T> Batched<K, T> {
    /// Every batch succeeded.
    pub fn complete(values: HashMap<K, T>) -> Self {
        Self {
            values,
            failed: HashSet::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<K: Eq + Hash, T> Default for Batched<K, T> {
    fn default() -> Self {
        Self::complete(HashMap::new())
    }
}

/// Partner reward ledger: weekly rewards, split history and farm distributions.
#[async_trait]
pub trait RewardLedgerSource: Send + Sync {
    /// Reward rows per wallet over `range`. Wallets with no rewards may be
    /// absent from `values`; wallets whose batch failed are in `failed`.
    async fn wallet_rewards(
        &self,
        wallets: &[WalletAddress],
        range: WeekRange,
    ) -> Result<Batched<WalletAddress, Vec<WalletRewardRow>>, SourceError>;

    /// Deposit split history per wallet.
    async fn deposit_splits(
        &self,
        wallets: &[WalletAddress],
    ) -> Result<Batched<WalletAddress, Vec<DepositSplitSegment>>, SourceError>;

    /// Weekly protocol-deposit distributions per farm over `range`.
    async fn farm_distributions(
        &self,
        farm_ids: &[FarmId],
        range: WeekRange,
    ) -> Result<Batched<FarmId, Vec<FarmDistributionRow>>, SourceError>;
}

/// On-chain claim indexer.
#[async_trait]
pub trait ClaimsSource: Send + Sync {
    /// All claim transfers for `wallet`.
    async fn claims(&self, wallet: &WalletAddress) -> Result<ClaimsSnapshot, SourceError>;
}

/// Live ERC-20 balance of GLW.
#[async_trait]
pub trait LiquidBalanceSource: Send + Sync {
    /// Current liquid GLW in wei.
    async fn live_balance(&self, wallet: &WalletAddress) -> Result<u128, SourceError>;
}

/// Stored end-of-week balance snapshots.
#[async_trait]
pub trait BalanceSnapshotStore: Send + Sync {
    /// Snapshots for `wallet` inside `range`, keyed by week.
    async fn weekly_balances(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, BalanceSnapshot>, SourceError>;
}

/// External steering data (Control API).
#[async_trait]
pub trait SteeringSource: Send + Sync {
    /// Wallet stake per region for each epoch in `range`.
    async fn wallet_stake_by_epoch(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<Vec<WalletRegionStake>, SourceError>;

    /// Regional stake and emission for one epoch.
    async fn region_rewards_at(&self, week: Week) -> Result<Vec<RegionRewardSnapshot>, SourceError>;

    /// Wallet's current stake per region. Rows carry the current week.
    async fn current_wallet_stake(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<WalletRegionStake>, SourceError>;

    /// Current regional stake and emission.
    async fn current_region_rewards(&self) -> Result<Vec<RegionRewardSnapshot>, SourceError>;
}

/// Locally synced steering snapshots (read-through cache in front of [`SteeringSource`]).
#[async_trait]
pub trait SteeringSnapshotCache: Send + Sync {
    /// Cached region rewards for weeks in `range`. Absent weeks were never synced.
    async fn region_rewards(
        &self,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, Vec<RegionRewardSnapshot>>, SourceError>;

    /// Stores one week of region rewards.
    async fn store_region_rewards(
        &self,
        week: Week,
        rows: &[RegionRewardSnapshot],
    ) -> Result<(), SourceError>;

    /// Cached wallet stakes for weeks in `range`. A present week with an empty
    /// list means "synced, no stake".
    async fn wallet_stakes(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, Vec<WalletRegionStake>>, SourceError>;

    /// Stores one week of a wallet's stakes.
    async fn store_wallet_stakes(
        &self,
        wallet: &WalletAddress,
        week: Week,
        rows: &[WalletRegionStake],
    ) -> Result<(), SourceError>;
}

/// Locally recorded fraction purchases, refunds and farm principals.
#[async_trait]
pub trait PurchaseSource: Send + Sync {
    /// Purchases by `wallet` with `timestamp < until`.
    async fn purchases(
        &self,
        wallet: &WalletAddress,
        until: u64,
    ) -> Result<Vec<PurchaseRecord>, SourceError>;

    /// Refunds to `wallet` with `timestamp < until`.
    async fn refunds(&self, wallet: &WalletAddress, until: u64)
        -> Result<Vec<RefundRecord>, SourceError>;

    /// Principal for each known farm in `farm_ids`.
    async fn farm_principals(&self, farm_ids: &[FarmId]) -> Result<Vec<FarmPrincipal>, SourceError>;
}

/// A feed of wallets eligible for the leaderboards.
#[async_trait]
pub trait WalletUniverseSource: Send + Sync {
    /// Feed name used in logs.
    fn feed_name(&self) -> &'static str;

    /// Raw wallet addresses; callers normalize and dedupe.
    async fn universe_wallets(&self) -> Result<Vec<String>, SourceError>;
}
