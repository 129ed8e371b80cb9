//! HTTP collaborators for the impact engine
//!
//! - [`ControlApiClient`]: reward ledger, deposit splits, farm distributions
//!   and steering stake from the Control API
//! - [`ClaimsIndexerClient`]: claim transfers and current GLW holders
//! - [`RpcBalanceClient`]: liquid GLW via `eth_call balanceOf` with a
//!   fallback RPC
//!
//! Every client implements the matching trait from `glow_scoring::sources`.

mod claims;
mod control_api;
mod rpc;
mod wire;

use glow_scoring::SourceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use claims::ClaimsIndexerClient;
pub use control_api::{ControlApiClient, SplitHoldersFeed, StakersFeed};
pub use rpc::{balance_of_call_data, is_retryable_status, RpcBalanceClient};

#[derive(Debug, Error)]
pub enum ClientError {
    /// A required endpoint is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Claims indexer answered 503 or reported `indexingComplete != true`
    #[error("Claims indexer is still indexing")]
    IndexingIncomplete,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Primary and fallback RPC failed: primary={primary}; fallback={fallback}")]
    RpcExhausted { primary: String, fallback: String },
}

impl ClientError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ClientError> for SourceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Config(msg) => SourceError::Config(msg),
            ClientError::IndexingIncomplete => SourceError::IndexingIncomplete,
            ClientError::InvalidResponse(msg) => SourceError::InvalidResponse(msg),
            ClientError::Rpc { .. } => SourceError::InvalidResponse(err.to_string()),
            ClientError::Http(_) | ClientError::RpcExhausted { .. } => {
                SourceError::Unavailable(err.to_string())
            }
        }
    }
}

/// Endpoints and fan-out limits shared by the HTTP clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub control_api_url: String,

    pub claims_api_url: String,

    pub rpc_url: String,

    #[serde(default)]
    pub rpc_fallback_url: Option<String>,

    #[serde(default = "default_glw_token_address")]
    pub glw_token_address: String,

    /// Wallets or farms per batch POST
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Batch POSTs in flight at once
    #[serde(default = "default_concurrent_batches")]
    pub concurrent_batches: usize,

    #[serde(default = "default_region_cache_ttl", with = "humantime_serde")]
    pub region_cache_ttl: Duration,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Extra attempts against the fallback RPC
    #[serde(default = "default_fallback_retries")]
    pub fallback_retries: u32,
}

fn default_glw_token_address() -> String {
    glow_ledger::reconciler::GLW_TOKEN_ADDRESS.to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_concurrent_batches() -> usize {
    5
}

fn default_region_cache_ttl() -> Duration {
    Duration::from_secs(30)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_fallback_retries() -> u32 {
    2
}

impl ClientConfig {
    pub fn new(control_api_url: &str, claims_api_url: &str, rpc_url: &str) -> Self {
        Self {
            control_api_url: control_api_url.to_string(),
            claims_api_url: claims_api_url.to_string(),
            rpc_url: rpc_url.to_string(),
            rpc_fallback_url: None,
            glw_token_address: default_glw_token_address(),
            batch_size: default_batch_size(),
            concurrent_batches: default_concurrent_batches(),
            region_cache_ttl: default_region_cache_ttl(),
            request_timeout: default_request_timeout(),
            fallback_retries: default_fallback_retries(),
        }
    }

    /// Checks every endpoint, the token address and the fan-out limits.
    pub fn validate(&self) -> Result<(), ClientError> {
        normalize_base_url("control_api_url", &self.control_api_url)?;
        normalize_base_url("claims_api_url", &self.claims_api_url)?;
        normalize_base_url("rpc_url", &self.rpc_url)?;
        if let Some(url) = &self.rpc_fallback_url {
            normalize_base_url("rpc_fallback_url", url)?;
        }
        glow_types::WalletAddress::parse(&self.glw_token_address)
            .map_err(|e| ClientError::Config(format!("glw_token_address: {e}")))?;
        if self.batch_size == 0 || self.concurrent_batches == 0 {
            return Err(ClientError::Config(
                "batch_size and concurrent_batches must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validates an endpoint and strips trailing slashes.
pub(crate) fn normalize_base_url(name: &str, url: &str) -> Result<String, ClientError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Config(format!("{name} is not configured")));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientError::Config(format!(
            "{name} must be an http(s) URL: {trimmed}"
        )));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder().no_proxy().timeout(timeout).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url_is_config_error() {
        let err = normalize_base_url("control_api_url", "  ").expect_err("empty url");
        assert!(matches!(err, ClientError::Config(_)));
        assert!(matches!(SourceError::from(err), SourceError::Config(_)));

        let err = normalize_base_url("rpc_url", "localhost:8545").expect_err("no scheme");
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_token_address() {
        let mut config = ClientConfig::new(
            "https://control.example/",
            "https://claims.example",
            "https://rpc.example",
        );
        assert!(config.validate().is_ok());

        config.glw_token_address = "0x1234".to_string();
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_indexing_incomplete_maps_to_source_error() {
        assert_eq!(
            SourceError::from(ClientError::IndexingIncomplete),
            SourceError::IndexingIncomplete
        );
    }

    #[test]
    fn test_config_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{
                "control_api_url": "https://control.example",
                "claims_api_url": "https://claims.example",
                "rpc_url": "https://rpc.example",
                "region_cache_ttl": "1m"
            }"#,
        )
        .expect("config");
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.concurrent_batches, 5);
        assert_eq!(config.region_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.glw_token_address, glow_ledger::reconciler::GLW_TOKEN_ADDRESS);
        assert!(config.rpc_fallback_url.is_none());
    }
}
