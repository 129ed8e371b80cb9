//! Mock claims indexer.

use async_trait::async_trait;
use glow_scoring::{ClaimsSource, SourceError};
use glow_types::{ClaimEvent, ClaimsSnapshot, WalletAddress};
use std::collections::HashMap;

/// Claim transfers per wallet. Unknown wallets have claimed nothing.
#[derive(Debug, Clone)]
pub struct MockClaimsIndexer {
    claims: HashMap<WalletAddress, Vec<ClaimEvent>>,
    failing: HashMap<WalletAddress, SourceError>,
    /// Report `indexingComplete = false` for every wallet
    indexing: bool,
}

impl Default for MockClaimsIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClaimsIndexer {
    pub fn new() -> Self {
        Self {
            claims: HashMap::new(),
            failing: HashMap::new(),
            indexing: false,
        }
    }

    /// Configure the indexer as still catching up.
    pub fn with_indexing(mut self, indexing: bool) -> Self {
        self.indexing = indexing;
        self
    }

    pub fn add_claim(&mut self, wallet: &WalletAddress, claim: ClaimEvent) {
        self.claims.entry(wallet.clone()).or_default().push(claim);
    }

    /// Make lookups for `wallet` fail with `error`.
    pub fn fail_wallet(&mut self, wallet: &WalletAddress, error: SourceError) {
        self.failing.insert(wallet.clone(), error);
    }
}

#[async_trait]
impl ClaimsSource for MockClaimsIndexer {
    async fn claims(&self, wallet: &WalletAddress) -> Result<ClaimsSnapshot, SourceError> {
        if self.indexing {
            return Err(SourceError::IndexingIncomplete);
        }
        if let Some(error) = self.failing.get(wallet) {
            return Err(error.clone());
        }
        Ok(ClaimsSnapshot {
            indexing_complete: true,
            claims: self.claims.get(wallet).cloned().unwrap_or_default(),
        })
    }
}
