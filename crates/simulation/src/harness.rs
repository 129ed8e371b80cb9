//! Test harness wiring the mocks into a scoring engine and leaderboard.

use crate::mocks::{
    MockClaimsIndexer, MockLiquidBalance, MockRewardLedger, MockSteering, MockUniverseFeed,
};
use glow_leaderboard::{LeaderboardConfig, LeaderboardService, Materializer, WalletUniverse};
use glow_primitives::{week_start_timestamp, Clock, ManualClock, Week};
use glow_scoring::{ScoringConfig, ScoringEngine, ScoringSources, WalletUniverseSource};
use glow_storage::{MemoryBackend, SnapshotStore, StorageManager};
use glow_types::{FarmPrincipal, PurchaseKind, PurchaseRecord, WalletAddress};
use std::sync::Arc;

/// Week the harness clock starts in unless told otherwise.
pub const DEFAULT_HARNESS_WEEK: Week = 110;

/// Deterministic test wallet `n`: `0x000…0n` as 40 hex digits.
pub fn wallet(n: u64) -> WalletAddress {
    WalletAddress::parse(&format!("0x{n:040x}")).expect("generated address is valid")
}

/// Mocks, an in-memory store and a manual clock.
///
/// Configure the public fields, then build an engine, materializer or
/// service. Each build snapshots the mocks as they are at that moment.
pub struct TestHarness {
    pub ledger: MockRewardLedger,
    pub claims: MockClaimsIndexer,
    pub liquid: MockLiquidBalance,
    pub steering: MockSteering,
    pub feeds: Vec<MockUniverseFeed>,
    pub backend: Arc<MemoryBackend>,
    pub clock: Arc<ManualClock>,
    pub scoring: ScoringConfig,
    pub leaderboard: LeaderboardConfig,
    /// Read steering through the snapshot cache in `backend`
    pub use_steering_cache: bool,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::at_week(DEFAULT_HARNESS_WEEK)
    }

    /// Harness whose clock sits one hour into `week`.
    pub fn at_week(week: Week) -> Self {
        Self {
            ledger: MockRewardLedger::new(),
            claims: MockClaimsIndexer::new(),
            liquid: MockLiquidBalance::new(),
            steering: MockSteering::new(),
            feeds: Vec::new(),
            backend: Arc::new(MemoryBackend::new()),
            clock: Arc::new(ManualClock::new(week_start_timestamp(week) + 3_600)),
            scoring: ScoringConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            use_steering_cache: true,
        }
    }

    pub fn storage(&self) -> StorageManager {
        StorageManager::memory(self.backend.clone())
    }

    pub fn sources(&self) -> ScoringSources {
        let storage = self.storage();
        ScoringSources {
            rewards: Arc::new(self.ledger.clone()),
            claims: Arc::new(self.claims.clone()),
            liquid: Arc::new(self.liquid.clone()),
            balances: storage.balances(),
            steering: Arc::new(self.steering.clone()),
            steering_cache: self.use_steering_cache.then(|| storage.steering_cache()),
            purchases: storage.purchases(),
        }
    }

    pub fn engine(&self) -> Arc<ScoringEngine> {
        let clock: Arc<dyn Clock> = self.clock.clone();
        Arc::new(ScoringEngine::new(self.sources(), self.scoring.clone(), clock))
    }

    /// Universe made of the configured feeds plus recorded purchasers.
    pub fn universe(&self) -> WalletUniverse {
        let mut feeds: Vec<Arc<dyn WalletUniverseSource>> = self
            .feeds
            .iter()
            .cloned()
            .map(|feed| Arc::new(feed) as Arc<dyn WalletUniverseSource>)
            .collect();
        feeds.push(self.storage().purchasers());
        WalletUniverse::new(feeds)
    }

    pub fn materializer(&self) -> Arc<Materializer> {
        let store: Arc<dyn SnapshotStore> = self.backend.clone();
        Arc::new(Materializer::new(
            self.engine(),
            self.universe(),
            store,
            self.leaderboard.clone(),
        ))
    }

    pub fn service(&self) -> LeaderboardService {
        LeaderboardService::new(self.materializer())
    }

    /// Adds a universe feed listing `wallets`.
    pub fn add_feed(&mut self, name: &'static str, wallets: &[WalletAddress]) {
        self.feeds.push(MockUniverseFeed::new(
            name,
            wallets.iter().map(|w| w.to_string()).collect(),
        ));
    }

    pub async fn record_purchase(
        &self,
        wallet: &WalletAddress,
        kind: PurchaseKind,
        amount_glw_wei: u128,
        timestamp: u64,
    ) {
        self.backend
            .record_purchase(PurchaseRecord {
                wallet: wallet.clone(),
                kind,
                amount_glw_wei,
                timestamp,
            })
            .await;
    }

    pub async fn record_farm(&self, farm_id: &str, region_id: Option<u32>, principal_glw_wei: u128) {
        self.backend
            .record_farm_principal(FarmPrincipal {
                farm_id: farm_id.to_string(),
                region_id,
                principal_glw_wei,
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallets_are_distinct_and_ordered() {
        assert!(wallet(1) < wallet(2));
        assert_eq!(wallet(255).as_str(), "0x00000000000000000000000000000000000000ff");
    }

    #[test]
    fn test_clock_starts_inside_week() {
        let harness = TestHarness::at_week(120);
        assert_eq!(harness.engine().current_week(), 120);
    }
}
