//! Mock wallet universe feed.

use async_trait::async_trait;
use glow_scoring::{SourceError, WalletUniverseSource};

/// A fixed list of raw addresses, or a fixed failure.
#[derive(Debug, Clone)]
pub struct MockUniverseFeed {
    name: &'static str,
    wallets: Vec<String>,
    error: Option<SourceError>,
}

impl MockUniverseFeed {
    pub fn new(name: &'static str, wallets: Vec<String>) -> Self {
        Self {
            name,
            wallets,
            error: None,
        }
    }

    /// A feed that always fails with `error`.
    pub fn failing(name: &'static str, error: SourceError) -> Self {
        Self {
            name,
            wallets: Vec::new(),
            error: Some(error),
        }
    }
}

#[async_trait]
impl WalletUniverseSource for MockUniverseFeed {
    fn feed_name(&self) -> &'static str {
        self.name
    }

    async fn universe_wallets(&self) -> Result<Vec<String>, SourceError> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(self.wallets.clone()),
        }
    }
}
