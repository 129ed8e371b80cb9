//! Mock partner reward ledger.

use async_trait::async_trait;
use glow_scoring::{Batched, RewardLedgerSource, SourceError};
use glow_types::{
    DepositSplitSegment, FarmDistributionRow, FarmId, WalletAddress, WalletRewardRow, WeekRange,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Reward rows, split history and farm distributions held in memory.
///
/// # Example
///
/// ```rust,ignore
/// let mut ledger = MockRewardLedger::new();
/// ledger.add_split(&wallet, DepositSplitSegment { .. });
/// ledger.add_distribution(FarmDistributionRow { .. });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockRewardLedger {
    rewards: HashMap<WalletAddress, Vec<WalletRewardRow>>,
    splits: HashMap<WalletAddress, Vec<DepositSplitSegment>>,
    distributions: Vec<FarmDistributionRow>,
    /// Fail every wallet reward batch
    fail_rewards: bool,
    /// Fail every split batch
    fail_splits: bool,
    /// Wallets reported as part of a failed batch while others succeed
    failed_wallets: HashSet<WalletAddress>,
    /// Farms reported as part of a failed distribution batch
    failed_farms: HashSet<FarmId>,
    batch_calls: Arc<AtomicUsize>,
}

impl MockRewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure wallet reward batches to fail.
    pub fn with_fail_rewards(mut self, fail: bool) -> Self {
        self.fail_rewards = fail;
        self
    }

    /// Configure split batches to fail.
    pub fn with_fail_splits(mut self, fail: bool) -> Self {
        self.fail_splits = fail;
        self
    }

    pub fn add_reward(&mut self, wallet: &WalletAddress, row: WalletRewardRow) {
        self.rewards.entry(wallet.clone()).or_default().push(row);
    }

    pub fn add_split(&mut self, wallet: &WalletAddress, segment: DepositSplitSegment) {
        self.splits.entry(wallet.clone()).or_default().push(segment);
    }

    pub fn add_distribution(&mut self, row: FarmDistributionRow) {
        self.distributions.push(row);
    }

    /// Report `wallet` in a failed reward and split batch; other wallets succeed.
    pub fn fail_wallet_batch(&mut self, wallet: &WalletAddress) {
        self.failed_wallets.insert(wallet.clone());
    }

    /// Report `farm_id` in a failed distribution batch.
    pub fn fail_farm_batch(&mut self, farm_id: &str) {
        self.failed_farms.insert(farm_id.to_string());
    }

    fn partial<T>(
        &self,
        wallets: &[WalletAddress],
        lookup: impl Fn(&WalletAddress) -> Option<T>,
    ) -> Batched<WalletAddress, T> {
        let mut batched = Batched::default();
        for wallet in wallets {
            if self.failed_wallets.contains(wallet) {
                batched.failed.insert(wallet.clone());
            } else if let Some(value) = lookup(wallet) {
                batched.values.insert(wallet.clone(), value);
            }
        }
        batched
    }

    /// Batch requests served so far, across all clones.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RewardLedgerSource for MockRewardLedger {
    async fn wallet_rewards(
        &self,
        wallets: &[WalletAddress],
        range: WeekRange,
    ) -> Result<Batched<WalletAddress, Vec<WalletRewardRow>>, SourceError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_rewards {
            return Err(SourceError::Unavailable("mock reward ledger down".to_string()));
        }
        Ok(self.partial(wallets, |wallet| {
            let rows = self
                .rewards
                .get(wallet)?
                .iter()
                .filter(|row| range.contains(row.week))
                .cloned()
                .collect();
            Some(rows)
        }))
    }

    async fn deposit_splits(
        &self,
        wallets: &[WalletAddress],
    ) -> Result<Batched<WalletAddress, Vec<DepositSplitSegment>>, SourceError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_splits {
            return Err(SourceError::Unavailable("mock split history down".to_string()));
        }
        Ok(self.partial(wallets, |wallet| self.splits.get(wallet).cloned()))
    }

    async fn farm_distributions(
        &self,
        farm_ids: &[FarmId],
        range: WeekRange,
    ) -> Result<Batched<FarmId, Vec<FarmDistributionRow>>, SourceError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let mut batched: Batched<FarmId, Vec<FarmDistributionRow>> = Batched::default();
        for farm_id in farm_ids {
            if self.failed_farms.contains(farm_id) {
                batched.failed.insert(farm_id.clone());
                continue;
            }
            let rows: Vec<FarmDistributionRow> = self
                .distributions
                .iter()
                .filter(|row| &row.farm_id == farm_id && range.contains(row.week))
                .cloned()
                .collect();
            if !rows.is_empty() {
                batched.values.insert(farm_id.clone(), rows);
            }
        }
        Ok(batched)
    }
}
