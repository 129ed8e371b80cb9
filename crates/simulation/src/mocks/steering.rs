//! Mock Control API steering endpoints.

use async_trait::async_trait;
use glow_scoring::{SourceError, SteeringSource};
use glow_types::{RegionRewardSnapshot, WalletAddress, WalletRegionStake, Week, WeekRange};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-epoch region rewards and wallet stakes.
///
/// Epochs with no configured rewards answer with an empty list, as the
/// Control API does for epochs nobody steered.
#[derive(Debug, Clone, Default)]
pub struct MockSteering {
    region_rewards: BTreeMap<Week, Vec<RegionRewardSnapshot>>,
    stakes: HashMap<WalletAddress, Vec<WalletRegionStake>>,
    current_regions: Vec<RegionRewardSnapshot>,
    current_stakes: HashMap<WalletAddress, Vec<WalletRegionStake>>,
    /// Fail every historical (per-epoch) request
    fail_history: bool,
    epoch_calls: Arc<AtomicUsize>,
}

impl MockSteering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure stake-by-epoch and region-rewards-by-epoch to fail.
    pub fn with_fail_history(mut self, fail: bool) -> Self {
        self.fail_history = fail;
        self
    }

    pub fn add_region_reward(&mut self, snapshot: RegionRewardSnapshot) {
        self.region_rewards
            .entry(snapshot.week)
            .or_default()
            .push(snapshot);
    }

    pub fn add_stake(&mut self, wallet: &WalletAddress, stake: WalletRegionStake) {
        self.stakes.entry(wallet.clone()).or_default().push(stake);
    }

    pub fn set_current_regions(&mut self, regions: Vec<RegionRewardSnapshot>) {
        self.current_regions = regions;
    }

    pub fn set_current_stake(&mut self, wallet: &WalletAddress, stakes: Vec<WalletRegionStake>) {
        self.current_stakes.insert(wallet.clone(), stakes);
    }

    /// Per-epoch region reward requests served so far, across all clones.
    pub fn epoch_calls(&self) -> usize {
        self.epoch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SteeringSource for MockSteering {
    async fn wallet_stake_by_epoch(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<Vec<WalletRegionStake>, SourceError> {
        if self.fail_history {
            return Err(SourceError::Unavailable("mock stake history down".to_string()));
        }
        Ok(self
            .stakes
            .get(wallet)
            .map(|rows| {
                rows.iter()
                    .filter(|row| range.contains(row.week))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn region_rewards_at(&self, week: Week) -> Result<Vec<RegionRewardSnapshot>, SourceError> {
        self.epoch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_history {
            return Err(SourceError::Unavailable("mock region history down".to_string()));
        }
        Ok(self.region_rewards.get(&week).cloned().unwrap_or_default())
    }

    async fn current_wallet_stake(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<WalletRegionStake>, SourceError> {
        Ok(self.current_stakes.get(wallet).cloned().unwrap_or_default())
    }

    async fn current_region_rewards(&self) -> Result<Vec<RegionRewardSnapshot>, SourceError> {
        Ok(self.current_regions.clone())
    }
}
