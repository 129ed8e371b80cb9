//! Mock ERC-20 balance source.

use async_trait::async_trait;
use glow_scoring::{LiquidBalanceSource, SourceError};
use glow_types::WalletAddress;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Live GLW balances. Unknown wallets hold nothing.
#[derive(Debug, Clone, Default)]
pub struct MockLiquidBalance {
    balances: HashMap<WalletAddress, u128>,
    failing: HashSet<WalletAddress>,
    /// Delay before every answer
    latency: Option<Duration>,
}

impl MockLiquidBalance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure a delay for every lookup (for timeout tests).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_balance(&mut self, wallet: &WalletAddress, balance_wei: u128) {
        self.balances.insert(wallet.clone(), balance_wei);
    }

    /// Make lookups for `wallet` fail as if both RPCs were down.
    pub fn fail_wallet(&mut self, wallet: &WalletAddress) {
        self.failing.insert(wallet.clone());
    }
}

#[async_trait]
impl LiquidBalanceSource for MockLiquidBalance {
    async fn live_balance(&self, wallet: &WalletAddress) -> Result<u128, SourceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(wallet) {
            return Err(SourceError::Unavailable("mock rpc down".to_string()));
        }
        Ok(self.balances.get(wallet).copied().unwrap_or(0))
    }
}
