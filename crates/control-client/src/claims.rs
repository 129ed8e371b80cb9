use crate::wire::{ClaimsResponse, HoldersResponse};
use crate::{build_http_client, normalize_base_url, ClientConfig, ClientError};
use async_trait::async_trait;
use glow_scoring::{ClaimsSource, SourceError, WalletUniverseSource};
use glow_types::{ClaimsSnapshot, WalletAddress};
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Claims returned per request; the indexer caps pages at this size.
const CLAIMS_PAGE_LIMIT: u32 = 5000;

/// On-chain claims indexer.
///
/// Incomplete indexing is a hard failure: partial claim lists would make
/// already-claimed rewards look unclaimed.
#[derive(Debug, Clone)]
pub struct ClaimsIndexerClient {
    base_url: String,
    client: Client,
}

impl ClaimsIndexerClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: normalize_base_url("claims_api_url", &config.claims_api_url)?,
            client: build_http_client(config.request_timeout)?,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn fetch_claims(&self, wallet: &WalletAddress) -> Result<ClaimsSnapshot, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&format!("rewards/claims/{wallet}?limit={CLAIMS_PAGE_LIMIT}")))
            .send()
            .await?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Err(ClientError::IndexingIncomplete);
        }
        let body: ClaimsResponse = response.error_for_status()?.json().await?;
        let snapshot = claims_snapshot(body)?;
        debug!(wallet = %wallet, claims = snapshot.claims.len(), "Fetched claims");
        Ok(snapshot)
    }

    /// Current GLW holders known to the indexer.
    pub async fn holders(&self) -> Result<Vec<String>, ClientError> {
        let response: HoldersResponse = self
            .client
            .get(self.endpoint("glw/holders"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.holders)
    }
}

fn claims_snapshot(body: ClaimsResponse) -> Result<ClaimsSnapshot, ClientError> {
    if body.indexing_complete != Some(true) {
        return Err(ClientError::IndexingIncomplete);
    }
    let claims = body
        .claims
        .into_iter()
        .map(|c| c.into_event())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ClaimsSnapshot {
        indexing_complete: true,
        claims,
    })
}

#[async_trait]
impl ClaimsSource for ClaimsIndexerClient {
    async fn claims(&self, wallet: &WalletAddress) -> Result<ClaimsSnapshot, SourceError> {
        Ok(self.fetch_claims(wallet).await?)
    }
}

#[async_trait]
impl WalletUniverseSource for ClaimsIndexerClient {
    fn feed_name(&self) -> &'static str {
        "glw_holders"
    }

    async fn universe_wallets(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.holders().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_types::ClaimSource;

    #[test]
    fn test_claims_url_normalization() {
        let config = ClientConfig::new(
            "https://control.example",
            "https://claims.example//",
            "https://rpc.example",
        );
        let client = ClaimsIndexerClient::new(&config).expect("client");
        assert_eq!(
            client.endpoint("rewards/claims/0xabc?limit=5000"),
            "https://claims.example/rewards/claims/0xabc?limit=5000"
        );
    }

    #[test]
    fn test_incomplete_indexing_is_hard_failure() {
        let body: ClaimsResponse =
            serde_json::from_str(r#"{"indexingComplete": false, "claims": []}"#).expect("body");
        assert!(matches!(claims_snapshot(body), Err(ClientError::IndexingIncomplete)));

        let body: ClaimsResponse = serde_json::from_str(r#"{"claims": []}"#).expect("body");
        assert!(matches!(claims_snapshot(body), Err(ClientError::IndexingIncomplete)));
    }

    #[test]
    fn test_complete_claims_converted() {
        let body: ClaimsResponse = serde_json::from_str(
            r#"{
                "indexingComplete": true,
                "claims": [
                    {"token": "0xf4fbc617a5733eaaf9af08e1ab816b103388d8b6", "source": "minerPool",
                     "amount": "1000", "timestamp": 1760000000},
                    {"token": "0x0000000000000000000000000000000000000001", "source": "other",
                     "amount": "5", "timestamp": 1760000001}
                ]
            }"#,
        )
        .expect("body");
        let snapshot = claims_snapshot(body).expect("snapshot");
        assert!(snapshot.indexing_complete);
        assert_eq!(snapshot.claims.len(), 2);
        assert_eq!(snapshot.claims[0].source, ClaimSource::MinerPool);
        assert_eq!(snapshot.claims[1].source, ClaimSource::Other);
        assert_eq!(snapshot.claims[0].nonce, None);
    }
}
