//! JSON shapes returned by the upstream services and their conversion into
//! engine inputs.

use crate::ClientError;
use glow_types::{
    ClaimEvent, ClaimSource, DepositSplitSegment, FarmDistributionRow, RegionRewardSnapshot,
    WalletRegionStake, WalletRewardRow, Week,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Decimal wei string; empty or missing means zero.
pub(crate) fn parse_wei(field: &str, value: Option<&str>) -> Result<u128, ClientError> {
    match value.map(str::trim) {
        None | Some("") => Ok(0),
        Some(raw) => raw
            .parse::<u128>()
            .map_err(|_| ClientError::InvalidResponse(format!("{field}: {raw}"))),
    }
}

/// Integer that some services encode as a JSON number and others as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum LenientU64 {
    Number(u64),
    Text(String),
}

impl LenientU64 {
    pub(crate) fn value(&self, field: &str) -> Result<u64, ClientError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ClientError::InvalidResponse(format!("{field}: {s}"))),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WalletBatchRequest<'a> {
    pub wallets: &'a [String],
    pub start_week: Week,
    pub end_week: Week,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FarmBatchRequest<'a> {
    pub farm_ids: &'a [String],
    pub start_week: Week,
    pub end_week: Week,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FarmReward {
    pub week_number: Week,
    pub farm_id: String,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub wallet_total_glow_inflation_reward: Option<String>,
    #[serde(default)]
    pub wallet_protocol_deposit_from_launchpad: Option<String>,
    #[serde(default)]
    pub wallet_protocol_deposit_from_mining_center: Option<String>,
}

impl FarmReward {
    pub(crate) fn into_row(self) -> Result<WalletRewardRow, ClientError> {
        let inflation = parse_wei(
            "walletTotalGlowInflationReward",
            self.wallet_total_glow_inflation_reward.as_deref(),
        )?;
        let launchpad = parse_wei(
            "walletProtocolDepositFromLaunchpad",
            self.wallet_protocol_deposit_from_launchpad.as_deref(),
        )?;
        let mining_center = parse_wei(
            "walletProtocolDepositFromMiningCenter",
            self.wallet_protocol_deposit_from_mining_center.as_deref(),
        )?;
        Ok(WalletRewardRow {
            week: self.week_number,
            farm_id: Some(self.farm_id),
            region_id: None,
            asset: self.asset,
            inflation_glw_wei: inflation,
            protocol_deposit_received_wei: launchpad.saturating_add(mining_center),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WalletRewardsEntry {
    #[serde(default)]
    pub farm_rewards: Option<Vec<FarmReward>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WalletRewardsBatchResponse {
    #[serde(default)]
    pub results: HashMap<String, WalletRewardsEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SplitSegment {
    pub farm_id: String,
    pub start_week: Week,
    pub end_week: Week,
    pub deposit_split_percent6_decimals: String,
}

impl SplitSegment {
    pub(crate) fn into_segment(self) -> Result<DepositSplitSegment, ClientError> {
        Ok(DepositSplitSegment {
            split_scaled6: parse_wei(
                "depositSplitPercent6Decimals",
                Some(&self.deposit_split_percent6_decimals),
            )?,
            farm_id: self.farm_id,
            start_week: self.start_week,
            end_week: self.end_week,
        })
    }
}

/// Segments come back as a bare array per wallet.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SplitsBatchResponse {
    #[serde(default)]
    pub results: HashMap<String, Vec<SplitSegment>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FarmDistribution {
    pub week_number: Week,
    pub farm_id: String,
    #[serde(default)]
    pub payment_currency: Option<String>,
    #[serde(default)]
    pub protocol_deposit_rewards_distributed: Option<String>,
}

impl FarmDistribution {
    pub(crate) fn into_row(self) -> Result<FarmDistributionRow, ClientError> {
        Ok(FarmDistributionRow {
            distributed_wei: parse_wei(
                "protocolDepositRewardsDistributed",
                self.protocol_deposit_rewards_distributed.as_deref(),
            )?,
            farm_id: self.farm_id,
            week: self.week_number,
            asset: self.payment_currency,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FarmRewardsEntry {
    #[serde(default)]
    pub rewards: Vec<FarmDistribution>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FarmRewardsBatchResponse {
    #[serde(default)]
    pub results: HashMap<String, FarmRewardsEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegionReward {
    pub region_id: u32,
    #[serde(default)]
    pub gctl_staked: Option<String>,
    #[serde(default)]
    pub glw_reward: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegionRewardsResponse {
    #[serde(default)]
    pub region_rewards: Vec<RegionReward>,
}

impl RegionRewardsResponse {
    /// Stamps every region with `week`.
    pub(crate) fn into_snapshots(self, week: Week) -> Result<Vec<RegionRewardSnapshot>, ClientError> {
        self.region_rewards
            .into_iter()
            .map(|r| {
                Ok(RegionRewardSnapshot {
                    week,
                    region_id: r.region_id,
                    gctl_staked: parse_wei("gctlStaked", r.gctl_staked.as_deref())?,
                    glw_reward_wei: parse_wei("glwReward", r.glw_reward.as_deref())?,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegionStake {
    pub region_id: u32,
    #[serde(default)]
    pub total_staked: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpochStake {
    pub epoch: Week,
    #[serde(default)]
    pub regions: Vec<RegionStake>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StakeByEpochResponse {
    #[serde(default)]
    pub results: Vec<EpochStake>,
}

impl StakeByEpochResponse {
    pub(crate) fn into_stakes(self) -> Result<Vec<WalletRegionStake>, ClientError> {
        let mut out = Vec::new();
        for epoch in self.results {
            for region in epoch.regions {
                out.push(WalletRegionStake {
                    week: epoch.epoch,
                    region_id: region.region_id,
                    wallet_staked: parse_wei("totalStaked", region.total_staked.as_deref())?,
                });
            }
        }
        Ok(out)
    }
}

/// `GET /wallets/address/{wallet}`; only the region stake is read.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WalletResponse {
    #[serde(default)]
    pub regions: Vec<RegionStake>,
}

impl WalletResponse {
    pub(crate) fn into_stakes(self, week: Week) -> Result<Vec<WalletRegionStake>, ClientError> {
        self.regions
            .into_iter()
            .map(|r| {
                Ok(WalletRegionStake {
                    week,
                    region_id: r.region_id,
                    wallet_staked: parse_wei("totalStaked", r.total_staked.as_deref())?,
                })
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StakersResponse {
    #[serde(default)]
    pub stakers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SplitHoldersResponse {
    #[serde(default)]
    pub wallets: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawClaim {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub amount: Option<String>,
    pub timestamp: LenientU64,
    #[serde(default)]
    pub nonce: Option<LenientU64>,
}

impl RawClaim {
    pub(crate) fn into_event(self) -> Result<ClaimEvent, ClientError> {
        Ok(ClaimEvent {
            token: self.token.to_ascii_lowercase(),
            source: ClaimSource::from_label(&self.source),
            amount_wei: parse_wei("amount", self.amount.as_deref())?,
            timestamp: self.timestamp.value("timestamp")?,
            nonce: self.nonce.map(|n| n.value("nonce")).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClaimsResponse {
    #[serde(default)]
    pub indexing_complete: Option<bool>,
    #[serde(default)]
    pub claims: Vec<RawClaim>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HoldersResponse {
    #[serde(default)]
    pub holders: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farm_reward_sums_both_deposit_channels() {
        let json = r#"{
            "weekNumber": 101,
            "farmId": "farm-1",
            "asset": "GLW",
            "walletTotalGlowInflationReward": "1000",
            "walletProtocolDepositFromLaunchpad": "30",
            "walletProtocolDepositFromMiningCenter": "12"
        }"#;
        let reward: FarmReward = serde_json::from_str(json).expect("reward");
        let row = reward.into_row().expect("row");
        assert_eq!(row.week, 101);
        assert_eq!(row.inflation_glw_wei, 1000);
        assert_eq!(row.protocol_deposit_received_wei, 42);
        assert_eq!(row.protocol_deposit_glw_wei(), 42);
    }

    #[test]
    fn test_missing_amounts_are_zero() {
        let reward: FarmReward =
            serde_json::from_str(r#"{"weekNumber": 99, "farmId": "f"}"#).expect("reward");
        let row = reward.into_row().expect("row");
        assert_eq!(row.inflation_glw_wei, 0);
        assert_eq!(row.protocol_deposit_received_wei, 0);
    }

    #[test]
    fn test_malformed_amount_rejected() {
        assert!(matches!(
            parse_wei("glwReward", Some("1.5")),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_split_segments_are_bare_arrays() {
        let json = r#"{"results": {"0xabc": [
            {"farmId": "f1", "startWeek": 10, "endWeek": 20, "depositSplitPercent6Decimals": "500000"}
        ]}}"#;
        let response: SplitsBatchResponse = serde_json::from_str(json).expect("splits");
        let segment = response
            .results
            .into_values()
            .next()
            .and_then(|mut v| v.pop())
            .expect("segment")
            .into_segment()
            .expect("convert");
        assert_eq!(segment.split_scaled6, 500_000);
        assert!(segment.contains(15));
    }

    #[test]
    fn test_region_rewards_stamped_with_week() {
        let json = r#"{
            "totalGctlStaked": "300",
            "totalGlwRewards": "9",
            "regionRewards": [
                {"regionId": 1, "gctlStaked": "100", "glwReward": "3", "rewardShare": "0.33"},
                {"regionId": 2, "gctlStaked": "200", "glwReward": "6", "rewardShare": "0.66"}
            ]
        }"#;
        let response: RegionRewardsResponse = serde_json::from_str(json).expect("regions");
        let rows = response.into_snapshots(112).expect("rows");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.week == 112));
        assert_eq!(rows[1].glw_reward_wei, 6);
    }

    #[test]
    fn test_stake_by_epoch_flattens_regions() {
        let json = r#"{
            "wallet": "0xabc",
            "weekRange": {"startWeek": 100, "endWeek": 101},
            "results": [
                {"epoch": 100, "regions": [{"regionId": 1, "totalStaked": "5", "pendingUnstake": "0",
                  "pendingRestakeOut": "0", "pendingRestakeIn": "0"}]},
                {"epoch": 101, "regions": []}
            ]
        }"#;
        let response: StakeByEpochResponse = serde_json::from_str(json).expect("stakes");
        let stakes = response.into_stakes().expect("convert");
        assert_eq!(stakes.len(), 1);
        assert_eq!(stakes[0].week, 100);
        assert_eq!(stakes[0].wallet_staked, 5);
    }

    #[test]
    fn test_claim_accepts_string_numbers() {
        let json = r#"{
            "token": "0xF4fbC617A5733EAAF9af08E1Ab816B103388d8B6",
            "source": "rewardsKernel",
            "amount": "250",
            "timestamp": "1760000000",
            "nonce": 7
        }"#;
        let claim: RawClaim = serde_json::from_str(json).expect("claim");
        let event = claim.into_event().expect("event");
        assert_eq!(event.token, glow_ledger::reconciler::GLW_TOKEN_ADDRESS);
        assert_eq!(event.source, ClaimSource::RewardsKernel);
        assert_eq!(event.timestamp, 1_760_000_000);
        assert_eq!(event.nonce, Some(7));
    }
}
