use crate::wire::{
    FarmBatchRequest, FarmRewardsBatchResponse, RegionRewardsResponse, SplitHoldersResponse,
    SplitsBatchResponse, StakeByEpochResponse, StakersResponse, WalletBatchRequest,
    WalletResponse, WalletRewardsBatchResponse,
};
use crate::{build_http_client, normalize_base_url, ClientConfig, ClientError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use glow_primitives::{current_week, Clock};
use glow_scoring::{
    Batched, RewardLedgerSource, SourceError, SteeringSource, WalletUniverseSource,
};
use glow_storage::TtlCache;
use glow_types::{
    DepositSplitSegment, FarmDistributionRow, FarmId, RegionRewardSnapshot, WalletAddress,
    WalletRegionStake, WalletRewardRow, Week, WeekRange,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Control API client.
///
/// Batch endpoints are chunked into `batch_size` IDs with at most
/// `concurrent_batches` requests in flight. A failed batch is logged and
/// skipped; the call fails only when every batch failed.
pub struct ControlApiClient {
    base_url: String,
    client: Client,
    batch_size: usize,
    concurrent_batches: usize,
    /// Region rewards keyed by epoch; `None` is the live snapshot.
    region_cache: TtlCache<Option<Week>, Vec<RegionRewardSnapshot>>,
    clock: Arc<dyn Clock>,
}

impl ControlApiClient {
    pub fn new(config: &ClientConfig, clock: Arc<dyn Clock>) -> Result<Self, ClientError> {
        let base_url = normalize_base_url("control_api_url", &config.control_api_url)?;
        if config.batch_size == 0 || config.concurrent_batches == 0 {
            return Err(ClientError::Config(
                "batch_size and concurrent_batches must be positive".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            client: build_http_client(config.request_timeout)?,
            batch_size: config.batch_size,
            concurrent_batches: config.concurrent_batches,
            region_cache: TtlCache::new(config.region_cache_ttl, clock.clone()),
            clock,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .client
            .get(self.endpoint(path))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Runs `fetch` over `ids` in chunks and merges the per-chunk maps.
    ///
    /// IDs of failed chunks are returned in `failed` so callers can tell them
    /// apart from IDs with no data.
    async fn fetch_batched<T, F, Fut>(
        &self,
        label: &'static str,
        ids: Vec<String>,
        fetch: F,
    ) -> Result<Batched<String, T>, ClientError>
    where
        F: Fn(Vec<String>) -> Fut,
        Fut: Future<Output = Result<HashMap<String, T>, ClientError>>,
    {
        let mut merged = Batched::default();
        if ids.is_empty() {
            return Ok(merged);
        }

        let chunks: Vec<Vec<String>> = ids.chunks(self.batch_size).map(|c| c.to_vec()).collect();
        let total = chunks.len();
        let results: Vec<(Vec<String>, Result<HashMap<String, T>, ClientError>)> =
            stream::iter(chunks)
                .map(|chunk| {
                    let fut = fetch(chunk.clone());
                    async move { (chunk, fut.await) }
                })
                .buffer_unordered(self.concurrent_batches)
                .collect()
                .await;

        let mut succeeded = 0usize;
        let mut last_error = None;
        for (chunk, result) in results {
            match result {
                Ok(map) => {
                    succeeded += 1;
                    merged.values.extend(map);
                }
                Err(e) => {
                    warn!(batch = label, ids = chunk.len(), error = %e, "Control API batch failed");
                    merged.failed.extend(chunk);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => {
                debug!(
                    batch = label,
                    batches = total,
                    entries = merged.values.len(),
                    failed = merged.failed.len(),
                    "Control API batch complete"
                );
                Ok(merged)
            }
        }
    }

    async fn wallet_rewards_batch(
        &self,
        wallets: Vec<String>,
        range: WeekRange,
    ) -> Result<HashMap<String, Vec<WalletRewardRow>>, ClientError> {
        let body = WalletBatchRequest {
            wallets: &wallets,
            start_week: range.start_week,
            end_week: range.end_week,
        };
        let response: WalletRewardsBatchResponse = self
            .post_json("farms/by-wallet/farm-rewards-history/batch", &body)
            .await?;

        let mut out = HashMap::new();
        for (wallet, entry) in response.results {
            if let Some(error) = entry.error {
                debug!(wallet = %wallet, error = %error, "Control API reported wallet error");
            }
            let Some(rewards) = entry.farm_rewards else {
                continue;
            };
            let rows = rewards
                .into_iter()
                .map(|r| r.into_row())
                .collect::<Result<Vec<_>, _>>()?;
            out.insert(wallet.to_ascii_lowercase(), rows);
        }
        Ok(out)
    }

    async fn deposit_splits_batch(
        &self,
        wallets: Vec<String>,
        range: WeekRange,
    ) -> Result<HashMap<String, Vec<DepositSplitSegment>>, ClientError> {
        let body = WalletBatchRequest {
            wallets: &wallets,
            start_week: range.start_week,
            end_week: range.end_week,
        };
        let response: SplitsBatchResponse = self
            .post_json("farms/by-wallet/deposit-splits-history/batch", &body)
            .await?;

        let mut out = HashMap::new();
        for (wallet, segments) in response.results {
            if segments.is_empty() {
                continue;
            }
            let segments = segments
                .into_iter()
                .map(|s| s.into_segment())
                .collect::<Result<Vec<_>, _>>()?;
            out.insert(wallet.to_ascii_lowercase(), segments);
        }
        Ok(out)
    }

    async fn farm_distributions_batch(
        &self,
        farm_ids: Vec<String>,
        range: WeekRange,
    ) -> Result<HashMap<String, Vec<FarmDistributionRow>>, ClientError> {
        let body = FarmBatchRequest {
            farm_ids: &farm_ids,
            start_week: range.start_week,
            end_week: range.end_week,
        };
        let response: FarmRewardsBatchResponse =
            self.post_json("farms/rewards-history/batch", &body).await?;

        let mut out = HashMap::new();
        for (farm_id, entry) in response.results {
            let rows = entry
                .rewards
                .into_iter()
                .map(|r| r.into_row())
                .collect::<Result<Vec<_>, _>>()?;
            out.insert(farm_id, rows);
        }
        Ok(out)
    }

    async fn region_rewards_cached(
        &self,
        epoch: Option<Week>,
    ) -> Result<Vec<RegionRewardSnapshot>, ClientError> {
        if let Some(rows) = self.region_cache.get(&epoch).await {
            return Ok(rows);
        }

        let (path, week) = match epoch {
            Some(week) => (format!("regions/rewards/glw/regions?epoch={week}"), week),
            None => (
                "rewards/glw/regions".to_string(),
                current_week(self.clock.now_unix()),
            ),
        };
        let response: RegionRewardsResponse = self.get_json(&path).await?;
        let rows = response.into_snapshots(week)?;
        self.region_cache.insert(epoch, rows.clone()).await;
        Ok(rows)
    }

    /// Wallets holding any deposit split.
    pub async fn split_holders(&self) -> Result<Vec<String>, ClientError> {
        let response: SplitHoldersResponse =
            self.get_json("farms/by-wallet/deposit-splits/holders").await?;
        Ok(response.wallets)
    }

    /// Wallets with GCTL currently staked in any region.
    pub async fn stakers(&self) -> Result<Vec<String>, ClientError> {
        let response: StakersResponse = self.get_json("gctl/stakers").await?;
        Ok(response.stakers)
    }
}

fn wallet_keys(wallets: &[WalletAddress]) -> Vec<String> {
    let mut keys: Vec<String> = wallets.iter().map(|w| w.to_string()).collect();
    keys.sort();
    keys.dedup();
    keys
}

fn into_wallet_map<T>(batched: Batched<String, T>) -> Batched<WalletAddress, T> {
    let values = batched
        .values
        .into_iter()
        .filter_map(|(wallet, value)| match WalletAddress::parse(&wallet) {
            Ok(address) => Some((address, value)),
            Err(_) => {
                warn!(wallet = %wallet, "Dropping malformed wallet from Control API response");
                None
            }
        })
        .collect();
    // Failed keys came from our own request, so they parse.
    let failed = batched
        .failed
        .iter()
        .filter_map(|wallet| WalletAddress::parse(wallet).ok())
        .collect();
    Batched { values, failed }
}

#[async_trait]
impl RewardLedgerSource for ControlApiClient {
    async fn wallet_rewards(
        &self,
        wallets: &[WalletAddress],
        range: WeekRange,
    ) -> Result<Batched<WalletAddress, Vec<WalletRewardRow>>, SourceError> {
        let rows = self
            .fetch_batched("wallet_rewards", wallet_keys(wallets), |chunk| {
                self.wallet_rewards_batch(chunk, range)
            })
            .await?;
        Ok(into_wallet_map(rows))
    }

    async fn deposit_splits(
        &self,
        wallets: &[WalletAddress],
    ) -> Result<Batched<WalletAddress, Vec<DepositSplitSegment>>, SourceError> {
        let range = WeekRange {
            start_week: 0,
            end_week: current_week(self.clock.now_unix()),
        };
        let segments = self
            .fetch_batched("deposit_splits", wallet_keys(wallets), |chunk| {
                self.deposit_splits_batch(chunk, range)
            })
            .await?;
        Ok(into_wallet_map(segments))
    }

    async fn farm_distributions(
        &self,
        farm_ids: &[FarmId],
        range: WeekRange,
    ) -> Result<Batched<FarmId, Vec<FarmDistributionRow>>, SourceError> {
        let mut ids = farm_ids.to_vec();
        ids.sort();
        ids.dedup();
        Ok(self
            .fetch_batched("farm_distributions", ids, |chunk| {
                self.farm_distributions_batch(chunk, range)
            })
            .await?)
    }
}

#[async_trait]
impl SteeringSource for ControlApiClient {
    async fn wallet_stake_by_epoch(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<Vec<WalletRegionStake>, SourceError> {
        let path = format!(
            "wallets/address/{wallet}/stake-by-epoch?startEpoch={}&endEpoch={}",
            range.start_week, range.end_week
        );
        let response: StakeByEpochResponse = self.get_json(&path).await?;
        Ok(response.into_stakes()?)
    }

    async fn region_rewards_at(&self, week: Week) -> Result<Vec<RegionRewardSnapshot>, SourceError> {
        Ok(self.region_rewards_cached(Some(week)).await?)
    }

    async fn current_wallet_stake(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<WalletRegionStake>, SourceError> {
        let response: WalletResponse = self.get_json(&format!("wallets/address/{wallet}")).await?;
        Ok(response.into_stakes(current_week(self.clock.now_unix()))?)
    }

    async fn current_region_rewards(&self) -> Result<Vec<RegionRewardSnapshot>, SourceError> {
        Ok(self.region_rewards_cached(None).await?)
    }
}

/// Universe feed: wallets holding deposit splits.
pub struct SplitHoldersFeed(pub Arc<ControlApiClient>);

#[async_trait]
impl WalletUniverseSource for SplitHoldersFeed {
    fn feed_name(&self) -> &'static str {
        "split_holders"
    }

    async fn universe_wallets(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.0.split_holders().await?)
    }
}

/// Universe feed: current GCTL stakers.
pub struct StakersFeed(pub Arc<ControlApiClient>);

#[async_trait]
impl WalletUniverseSource for StakersFeed {
    fn feed_name(&self) -> &'static str {
        "stakers"
    }

    async fn universe_wallets(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.0.stakers().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_primitives::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client(batch_size: usize) -> ControlApiClient {
        let mut config = ClientConfig::new(
            "https://control.example/",
            "https://claims.example",
            "https://rpc.example",
        );
        config.batch_size = batch_size;
        ControlApiClient::new(&config, Arc::new(ManualClock::new(1_760_000_000))).expect("client")
    }

    #[test]
    fn test_control_api_url_normalization() {
        let client = client(500);
        assert_eq!(
            client.endpoint("/gctl/stakers"),
            "https://control.example/gctl/stakers"
        );
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = ClientConfig::new("https://c.example", "https://x.example", "https://r.example");
        config.batch_size = 0;
        let result = ControlApiClient::new(&config, Arc::new(ManualClock::new(0)));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_batched_chunks_and_merges() {
        let client = client(2);
        let calls = AtomicUsize::new(0);
        let ids: Vec<String> = (0..5).map(|i| format!("id-{i}")).collect();

        let merged = client
            .fetch_batched("test", ids, |chunk| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert!(chunk.len() <= 2);
                    Ok::<_, ClientError>(chunk.into_iter().map(|id| (id, 1u32)).collect())
                }
            })
            .await
            .expect("merged");

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(merged.values.len(), 5);
        assert!(merged.is_complete());
    }

    #[tokio::test]
    async fn test_fetch_batched_reports_failed_batch_ids() {
        let client = client(2);
        let ids: Vec<String> = (0..4).map(|i| format!("id-{i}")).collect();

        let merged = client
            .fetch_batched("test", ids, |chunk| async move {
                if chunk.contains(&"id-0".to_string()) {
                    Err(ClientError::InvalidResponse("boom".to_string()))
                } else {
                    Ok(chunk.into_iter().map(|id| (id, ())).collect())
                }
            })
            .await
            .expect("partial result");

        assert_eq!(merged.values.len(), 2);
        assert!(merged.values.contains_key("id-3"));
        let mut failed: Vec<&String> = merged.failed.iter().collect();
        failed.sort();
        assert_eq!(failed, vec!["id-0", "id-1"]);
    }

    #[tokio::test]
    async fn test_fetch_batched_fails_when_every_batch_fails() {
        let client = client(2);
        let ids: Vec<String> = (0..3).map(|i| format!("id-{i}")).collect();

        let result = client
            .fetch_batched::<(), _, _>("test", ids, |_| async {
                Err(ClientError::InvalidResponse("down".to_string()))
            })
            .await;

        assert!(matches!(result, Err(ClientError::InvalidResponse(_))));
    }

    #[test]
    fn test_failed_wallet_keys_survive_conversion() {
        let a = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string();
        let b = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string();
        let batched = Batched {
            values: [(a.clone(), 1u32)].into_iter().collect(),
            failed: [b.clone()].into_iter().collect(),
        };

        let converted = into_wallet_map(batched);
        assert_eq!(converted.values.len(), 1);
        assert!(converted
            .failed
            .contains(&WalletAddress::parse(&b).expect("b")));
    }

    #[test]
    fn test_wallet_keys_dedupe() {
        let a = WalletAddress::parse("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").expect("a");
        let keys = wallet_keys(&[a.clone(), a]);
        assert_eq!(keys.len(), 1);
    }
}
