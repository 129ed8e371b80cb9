//! In-memory backend for tests and database-less runs.

use crate::{SnapshotStore, StorageError};
use async_trait::async_trait;
use glow_scoring::{
    BalanceSnapshotStore, PurchaseSource, SourceError, SteeringSnapshotCache, WalletUniverseSource,
};
use glow_types::{
    BalanceSnapshot, DelegatorsSnapshot, FarmId, FarmPrincipal, ImpactLeaderboardSnapshot,
    PurchaseRecord, RefundRecord, RegionRewardSnapshot, WalletAddress, WalletRegionStake, Week,
    WeekRange,
};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    impact: Option<ImpactLeaderboardSnapshot>,
    delegators: Option<DelegatorsSnapshot>,
    region_rewards: BTreeMap<Week, Vec<RegionRewardSnapshot>>,
    wallet_stakes: HashMap<WalletAddress, BTreeMap<Week, Vec<WalletRegionStake>>>,
    balances: HashMap<WalletAddress, BTreeMap<Week, BalanceSnapshot>>,
    purchases: Vec<PurchaseRecord>,
    refunds: Vec<RefundRecord>,
    principals: BTreeMap<FarmId, FarmPrincipal>,
}

#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_purchase(&self, purchase: PurchaseRecord) {
        self.state.write().await.purchases.push(purchase);
    }

    pub async fn record_refund(&self, refund: RefundRecord) {
        self.state.write().await.refunds.push(refund);
    }

    pub async fn record_farm_principal(&self, principal: FarmPrincipal) {
        self.state
            .write()
            .await
            .principals
            .insert(principal.farm_id.clone(), principal);
    }

    pub async fn record_balance(&self, wallet: &WalletAddress, snapshot: BalanceSnapshot) {
        self.state
            .write()
            .await
            .balances
            .entry(wallet.clone())
            .or_default()
            .insert(snapshot.week, snapshot);
    }
}

#[async_trait]
impl SnapshotStore for MemoryBackend {
    async fn replace_impact_leaderboard(
        &self,
        snapshot: &ImpactLeaderboardSnapshot,
    ) -> Result<(), StorageError> {
        self.state.write().await.impact = Some(snapshot.clone());
        Ok(())
    }

    async fn impact_leaderboard(&self) -> Result<Option<ImpactLeaderboardSnapshot>, StorageError> {
        Ok(self.state.read().await.impact.clone())
    }

    async fn replace_delegators_leaderboard(
        &self,
        snapshot: &DelegatorsSnapshot,
    ) -> Result<(), StorageError> {
        self.state.write().await.delegators = Some(snapshot.clone());
        Ok(())
    }

    async fn delegators_leaderboard(&self) -> Result<Option<DelegatorsSnapshot>, StorageError> {
        Ok(self.state.read().await.delegators.clone())
    }
}

#[async_trait]
impl SteeringSnapshotCache for MemoryBackend {
    async fn region_rewards(
        &self,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, Vec<RegionRewardSnapshot>>, SourceError> {
        let state = self.state.read().await;
        Ok(state
            .region_rewards
            .range(range.start_week..=range.end_week)
            .map(|(week, rows)| (*week, rows.clone()))
            .collect())
    }

    async fn store_region_rewards(
        &self,
        week: Week,
        rows: &[RegionRewardSnapshot],
    ) -> Result<(), SourceError> {
        self.state
            .write()
            .await
            .region_rewards
            .insert(week, rows.to_vec());
        Ok(())
    }

    async fn wallet_stakes(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, Vec<WalletRegionStake>>, SourceError> {
        let state = self.state.read().await;
        Ok(state
            .wallet_stakes
            .get(wallet)
            .map(|by_week| {
                by_week
                    .range(range.start_week..=range.end_week)
                    .map(|(week, rows)| (*week, rows.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn store_wallet_stakes(
        &self,
        wallet: &WalletAddress,
        week: Week,
        rows: &[WalletRegionStake],
    ) -> Result<(), SourceError> {
        self.state
            .write()
            .await
            .wallet_stakes
            .entry(wallet.clone())
            .or_default()
            .insert(week, rows.to_vec());
        Ok(())
    }
}

#[async_trait]
impl BalanceSnapshotStore for MemoryBackend {
    async fn weekly_balances(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, BalanceSnapshot>, SourceError> {
        let state = self.state.read().await;
        Ok(state
            .balances
            .get(wallet)
            .map(|by_week| {
                by_week
                    .range(range.start_week..=range.end_week)
                    .map(|(week, snapshot)| (*week, snapshot.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl PurchaseSource for MemoryBackend {
    async fn purchases(
        &self,
        wallet: &WalletAddress,
        until: u64,
    ) -> Result<Vec<PurchaseRecord>, SourceError> {
        let state = self.state.read().await;
        Ok(state
            .purchases
            .iter()
            .filter(|p| &p.wallet == wallet && p.timestamp < until)
            .cloned()
            .collect())
    }

    async fn refunds(&self, wallet: &WalletAddress, until: u64) -> Result<Vec<RefundRecord>, SourceError> {
        let state = self.state.read().await;
        Ok(state
            .refunds
            .iter()
            .filter(|r| &r.wallet == wallet && r.timestamp < until)
            .cloned()
            .collect())
    }

    async fn farm_principals(&self, farm_ids: &[FarmId]) -> Result<Vec<FarmPrincipal>, SourceError> {
        let state = self.state.read().await;
        Ok(farm_ids
            .iter()
            .filter_map(|id| state.principals.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl WalletUniverseSource for MemoryBackend {
    fn feed_name(&self) -> &'static str {
        "purchasers"
    }

    async fn universe_wallets(&self) -> Result<Vec<String>, SourceError> {
        let state = self.state.read().await;
        Ok(state
            .purchases
            .iter()
            .map(|p| p.wallet.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_types::PurchaseKind;

    fn wallet(byte: char) -> WalletAddress {
        WalletAddress::parse(&format!("0x{}", byte.to_string().repeat(40))).expect("valid")
    }

    #[tokio::test]
    async fn test_purchases_filtered_by_wallet_and_time() {
        let backend = MemoryBackend::new();
        for (w, ts) in [(wallet('a'), 10), (wallet('a'), 20), (wallet('b'), 5)] {
            backend
                .record_purchase(PurchaseRecord {
                    wallet: w,
                    kind: PurchaseKind::Launchpad,
                    amount_glw_wei: 1,
                    timestamp: ts,
                })
                .await;
        }

        let found = backend.purchases(&wallet('a'), 20).await.expect("purchases");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].timestamp, 10);
        assert_eq!(backend.universe_wallets().await.expect("universe").len(), 3);
    }

    #[tokio::test]
    async fn test_wallet_stakes_keep_empty_synced_weeks() {
        let backend = MemoryBackend::new();
        let w = wallet('c');
        backend.store_wallet_stakes(&w, 100, &[]).await.expect("store");
        let range = WeekRange::new(99, 101).expect("range");
        let cached = backend.wallet_stakes(&w, range).await.expect("read");
        assert_eq!(cached.len(), 1);
        assert!(cached[&100].is_empty());
    }

    #[tokio::test]
    async fn test_region_rewards_range_query() {
        let backend = MemoryBackend::new();
        for week in 95..=105 {
            backend
                .store_region_rewards(
                    week,
                    &[RegionRewardSnapshot {
                        week,
                        region_id: 1,
                        gctl_staked: 10,
                        glw_reward_wei: 10,
                    }],
                )
                .await
                .expect("store");
        }
        let range = WeekRange::new(100, 102).expect("range");
        let cached = backend.region_rewards(range).await.expect("read");
        assert_eq!(cached.keys().copied().collect::<Vec<_>>(), vec![100, 101, 102]);
    }
}
