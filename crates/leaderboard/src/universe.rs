//! Wallet universe: every wallet eligible for the leaderboards.

use crate::error::{LeaderboardError, Result};
use futures::future::join_all;
use glow_scoring::{SourceError, WalletUniverseSource};
use glow_types::{normalize_wallets, WalletAddress};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Union of wallet feeds (purchasers, split holders, GLW holders, stakers).
pub struct WalletUniverse {
    feeds: Vec<Arc<dyn WalletUniverseSource>>,
}

impl WalletUniverse {
    pub fn new(feeds: Vec<Arc<dyn WalletUniverseSource>>) -> Self {
        Self { feeds }
    }

    pub fn feed_names(&self) -> Vec<&'static str> {
        self.feeds.iter().map(|f| f.feed_name()).collect()
    }

    /// Lowercased, deduped and sorted wallets with `excluded` removed.
    ///
    /// A failing feed is skipped with a warning; the call fails only when
    /// every feed failed.
    pub async fn collect(&self, excluded: &HashSet<WalletAddress>) -> Result<Vec<WalletAddress>> {
        let results = join_all(self.feeds.iter().map(|feed| async move {
            (feed.feed_name(), feed.universe_wallets().await)
        }))
        .await;

        let mut raw = Vec::new();
        let mut failures = 0usize;
        let mut last_error = None;
        for (name, result) in results {
            match result {
                Ok(wallets) => {
                    info!(feed = name, wallets = wallets.len(), "universe feed loaded");
                    raw.extend(wallets);
                }
                Err(e) => {
                    warn!(feed = name, error = %e, "universe feed failed");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        if failures > 0 && failures == self.feeds.len() {
            return Err(LeaderboardError::Universe(last_error.unwrap_or_else(|| {
                SourceError::Unavailable("no universe feeds".to_string())
            })));
        }

        let mut wallets: Vec<WalletAddress> = normalize_wallets(raw)
            .into_iter()
            .filter(|w| !excluded.contains(w))
            .collect();
        wallets.sort();
        Ok(wallets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticFeed(&'static str, std::result::Result<Vec<String>, SourceError>);

    #[async_trait]
    impl WalletUniverseSource for StaticFeed {
        fn feed_name(&self) -> &'static str {
            self.0
        }

        async fn universe_wallets(&self) -> std::result::Result<Vec<String>, SourceError> {
            self.1.clone()
        }
    }

    fn addr(c: char) -> String {
        format!("0x{}", c.to_string().repeat(40))
    }

    #[tokio::test]
    async fn test_union_normalized_and_excluded() {
        let universe = WalletUniverse::new(vec![
            Arc::new(StaticFeed("purchasers", Ok(vec![addr('B'), addr('a')]))),
            Arc::new(StaticFeed("stakers", Ok(vec![addr('b'), "junk".to_string(), addr('c')]))),
            Arc::new(StaticFeed(
                "glw_holders",
                Err(SourceError::Unavailable("down".to_string())),
            )),
        ]);
        let excluded: HashSet<WalletAddress> =
            [WalletAddress::parse(&addr('c')).expect("c")].into_iter().collect();

        let wallets = universe.collect(&excluded).await.expect("universe");
        let as_str: Vec<&str> = wallets.iter().map(|w| w.as_str()).collect();
        assert_eq!(as_str, vec![addr('a').as_str(), addr('b').as_str()]);
    }

    #[tokio::test]
    async fn test_all_feeds_failing_is_error() {
        let universe = WalletUniverse::new(vec![Arc::new(StaticFeed(
            "stakers",
            Err(SourceError::Timeout(std::time::Duration::from_secs(1))),
        ))]);
        let result = universe.collect(&HashSet::new()).await;
        assert!(matches!(result, Err(LeaderboardError::Universe(_))));
    }
}
