//! Node configuration

use glow_control_client::{ClientConfig, ClientError};
use glow_leaderboard::LeaderboardConfig;
use glow_scoring::ScoringConfig;
use glow_storage::StorageBackendConfig;
use glow_types::WalletAddress;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid client config: {0}")]
    Client(#[from] ClientError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Impact node configuration loaded from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Control API, claims indexer and RPC endpoints
    pub client: ClientConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Snapshot store and steering cache (in-memory when omitted)
    #[serde(default = "default_storage")]
    pub storage: StorageBackendConfig,

    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    /// Pause between refresh cycles in `run` mode
    #[serde(default = "default_refresh_interval", with = "humantime_serde")]
    pub refresh_interval: Duration,
}

fn default_storage() -> StorageBackendConfig {
    StorageBackendConfig::Memory
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(3_600)
}

impl NodeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.client.validate()?;

        for (field, wallets) in [
            ("scoring.excluded_wallets", &self.scoring.excluded_wallets),
            ("scoring.foundation_wallets", &self.scoring.foundation_wallets),
        ] {
            if let Some(bad) = wallets.iter().find(|w| WalletAddress::parse(w).is_err()) {
                return Err(ConfigError::Invalid(format!("{field} contains {bad:?}")));
            }
        }

        if self.scoring.wallet_concurrency == 0 || self.scoring.region_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "scoring concurrency must be > 0".to_string(),
            ));
        }

        if self.scoring.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "scoring.fetch_timeout must be > 0".to_string(),
            ));
        }

        if self.leaderboard.group_size == 0 {
            return Err(ConfigError::Invalid(
                "leaderboard.group_size must be > 0".to_string(),
            ));
        }

        if let StorageBackendConfig::Postgres { url, .. } = &self.storage {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(ConfigError::Invalid(
                    "storage.url must start with postgres:// or postgresql://".to_string(),
                ));
            }
        }

        if self.refresh_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "refresh_interval must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"
refresh_interval = "30m"

[client]
control_api_url = "https://control.example/"
claims_api_url = "https://claims.example"
rpc_url = "https://rpc.example"
"#;

    fn write(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("impact-node.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let (_dir, path) = write(MINIMAL);
        let config = NodeConfig::load(&path).expect("load");
        config.validate().expect("valid");

        assert_eq!(config.refresh_interval, Duration::from_secs(1_800));
        assert!(matches!(config.storage, StorageBackendConfig::Memory));
        assert_eq!(config.scoring.wallet_concurrency, 8);
        assert_eq!(config.leaderboard.start_week, 97);
        assert_eq!(config.client.batch_size, 500);
    }

    #[test]
    fn test_full_config() {
        let (_dir, path) = write(
            r#"
[client]
control_api_url = "https://control.example"
claims_api_url = "https://claims.example"
rpc_url = "https://rpc.example"
rpc_fallback_url = "https://rpc-fallback.example"
concurrent_batches = 3

[scoring]
excluded_wallets = ["0x1111111111111111111111111111111111111111"]
foundation_wallets = ["0x2222222222222222222222222222222222222222"]
fetch_timeout = "10s"

[storage]
backend = "postgres"
url = "postgres://glow@localhost/impact"

[leaderboard]
group_size = 100
cache_ttl = "5m"
"#,
        );
        let config = NodeConfig::load(&path).expect("load");
        config.validate().expect("valid");

        assert_eq!(config.client.concurrent_batches, 3);
        assert_eq!(config.scoring.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.leaderboard.group_size, 100);
        assert!(matches!(
            config.storage,
            StorageBackendConfig::Postgres { max_connections: 5, .. }
        ));
    }

    #[test]
    fn test_missing_control_api_url_fails_validation() {
        let (_dir, path) = write(&MINIMAL.replace("https://control.example/", ""));
        let config = NodeConfig::load(&path).expect("load");
        assert!(matches!(config.validate(), Err(ConfigError::Client(_))));
    }

    #[test]
    fn test_bad_excluded_wallet_fails_validation() {
        let (_dir, path) = write(MINIMAL);
        let mut config = NodeConfig::load(&path).expect("load");
        config.scoring.excluded_wallets = vec!["not-a-wallet".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_client_section_fails_to_parse() {
        let (_dir, path) = write("refresh_interval = \"1h\"\n");
        assert!(matches!(NodeConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
