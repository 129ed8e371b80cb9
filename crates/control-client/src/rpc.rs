//! Liquid GLW balance over Ethereum JSON-RPC.

use crate::{build_http_client, normalize_base_url, ClientConfig, ClientError};
use async_trait::async_trait;
use glow_scoring::{LiquidBalanceSource, SourceError};
use glow_types::WalletAddress;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

/// `balanceOf(address)` selector.
const BALANCE_OF_SELECTOR: &str = "70a08231";

const FALLBACK_RETRY_DELAY: Duration = Duration::from_millis(200);

/// HTTP statuses worth retrying against the fallback RPC.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

fn is_retryable(err: &ClientError) -> bool {
    match err {
        ClientError::Http(e) => match e.status() {
            Some(status) => is_retryable_status(status.as_u16()),
            None => e.is_timeout() || e.is_connect() || e.is_request(),
        },
        _ => false,
    }
}

/// ABI-encoded call data for `balanceOf(wallet)`.
pub fn balance_of_call_data(wallet: &WalletAddress) -> String {
    let hex = wallet.as_str().trim_start_matches("0x");
    format!("0x{BALANCE_OF_SELECTOR}{hex:0>64}")
}

/// Decodes a `uint256` return value that must fit in `u128`.
fn decode_uint(result: &str) -> Result<u128, ClientError> {
    let hex = result.trim().trim_start_matches("0x");
    let significant = hex.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(0);
    }
    if significant.len() > 32 {
        return Err(ClientError::InvalidResponse(format!(
            "balance exceeds u128: 0x{hex}"
        )));
    }
    u128::from_str_radix(significant, 16)
        .map_err(|_| ClientError::InvalidResponse(format!("balance is not hex: {result}")))
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

/// `eth_call balanceOf` against a primary RPC, retried on a fallback RPC when
/// the primary fails with a transport-level error.
#[derive(Debug, Clone)]
pub struct RpcBalanceClient {
    primary_url: String,
    fallback_url: Option<String>,
    token_address: String,
    fallback_retries: u32,
    client: Client,
}

impl RpcBalanceClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let token_address = WalletAddress::parse(&config.glw_token_address)
            .map_err(|e| ClientError::Config(format!("glw_token_address: {e}")))?;
        let fallback_url = config
            .rpc_fallback_url
            .as_deref()
            .map(|url| normalize_base_url("rpc_fallback_url", url))
            .transpose()?;

        Ok(Self {
            primary_url: normalize_base_url("rpc_url", &config.rpc_url)?,
            fallback_url,
            token_address: token_address.to_string(),
            fallback_retries: config.fallback_retries,
            client: build_http_client(config.request_timeout)?,
        })
    }

    async fn call_balance(&self, url: &str, wallet: &WalletAddress) -> Result<u128, ClientError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": self.token_address, "data": balance_of_call_data(wallet) },
                "latest"
            ]
        });

        let response: RpcResponse = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        let result = response
            .result
            .ok_or_else(|| ClientError::InvalidResponse("eth_call returned no result".to_string()))?;
        decode_uint(&result)
    }

    pub async fn balance_of(&self, wallet: &WalletAddress) -> Result<u128, ClientError> {
        let primary_error = match self.call_balance(&self.primary_url, wallet).await {
            Ok(balance) => return Ok(balance),
            Err(e) => e,
        };
        let Some(fallback) = &self.fallback_url else {
            return Err(primary_error);
        };
        if !is_retryable(&primary_error) {
            return Err(primary_error);
        }

        warn!(wallet = %wallet, error = %primary_error, "Primary RPC failed, using fallback");
        let mut attempt = 0;
        loop {
            match self.call_balance(fallback, wallet).await {
                Ok(balance) => return Ok(balance),
                Err(e) if attempt < self.fallback_retries && is_retryable(&e) => {
                    attempt += 1;
                    tokio::time::sleep(FALLBACK_RETRY_DELAY).await;
                }
                Err(e) => {
                    return Err(ClientError::RpcExhausted {
                        primary: primary_error.to_string(),
                        fallback: e.to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl LiquidBalanceSource for RpcBalanceClient {
    async fn live_balance(&self, wallet: &WalletAddress) -> Result<u128, SourceError> {
        Ok(self.balance_of(wallet).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_data_layout() {
        let wallet = WalletAddress::parse("0x00000000000000000000000000000000000000ff").expect("w");
        let data = balance_of_call_data(&wallet);
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.starts_with("0x70a08231000000000000000000000000"));
        assert!(data.ends_with("ff"));
    }

    #[test]
    fn test_decode_uint() {
        assert_eq!(decode_uint("0x").expect("empty"), 0);
        assert_eq!(
            decode_uint("0x0000000000000000000000000000000000000000000000000de0b6b3a7640000")
                .expect("one glw"),
            1_000_000_000_000_000_000
        );
        assert!(decode_uint(&format!("0x1{}", "0".repeat(32))).is_err());
        assert!(decode_uint("0xzz").is_err());
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(is_retryable_status(status));
        }
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable(&ClientError::Rpc {
            code: -32000,
            message: "execution reverted".to_string(),
        }));
    }

    #[test]
    fn test_invalid_token_address_is_config_error() {
        let mut config = ClientConfig::new("https://c.example", "https://x.example", "https://r.example");
        config.glw_token_address = "glw".to_string();
        assert!(matches!(
            RpcBalanceClient::new(&config),
            Err(ClientError::Config(_))
        ));
    }
}
