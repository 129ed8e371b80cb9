//! Facts consumed by the engine: reward ledger rows, claims, steering
//! snapshots, purchases and balances.

use crate::serde_helpers::wei_string;
use crate::{FarmId, RegionId, WalletAddress, Week};
use serde::{Deserialize, Serialize};

fn is_glw(asset: Option<&str>) -> bool {
    asset.map(|a| a.eq_ignore_ascii_case("GLW")).unwrap_or(false)
}

/// One wallet's reward for one farm in one week, as reported by the reward ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRewardRow {
    pub week: Week,
    #[serde(default)]
    pub farm_id: Option<FarmId>,
    #[serde(default)]
    pub region_id: Option<RegionId>,
    /// Payment asset of the protocol-deposit portion (`"GLW"`, `"USDC"`, ...).
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(with = "wei_string")]
    pub inflation_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub protocol_deposit_received_wei: u128,
}

impl WalletRewardRow {
    /// Protocol-deposit amount counted in GLW. Non-GLW payouts count as zero.
    pub fn protocol_deposit_glw_wei(&self) -> u128 {
        if is_glw(self.asset.as_deref()) {
            self.protocol_deposit_received_wei
        } else {
            0
        }
    }
}

/// Protocol-deposit rewards distributed by a farm in one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmDistributionRow {
    pub farm_id: FarmId,
    pub week: Week,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(with = "wei_string")]
    pub distributed_wei: u128,
}

impl FarmDistributionRow {
    pub fn is_glw(&self) -> bool {
        is_glw(self.asset.as_deref())
    }
}

/// A wallet's ownership of a farm's remaining principal over an inclusive week range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositSplitSegment {
    pub farm_id: FarmId,
    pub start_week: Week,
    pub end_week: Week,
    /// `1_000_000` = 100%.
    pub split_scaled6: u128,
}

impl DepositSplitSegment {
    pub fn contains(&self, week: Week) -> bool {
        week >= self.start_week && week <= self.end_week
    }
}

/// Farm principal: completed, non-cancelled GLW payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmPrincipal {
    pub farm_id: FarmId,
    #[serde(default)]
    pub region_id: Option<RegionId>,
    #[serde(with = "wei_string")]
    pub principal_glw_wei: u128,
}

/// Contract that emitted a claim transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClaimSource {
    /// Protocol-deposit payouts; week is encoded in the nonce.
    RewardsKernel,
    /// Inflation payouts; week must be inferred from the amount.
    MinerPool,
    #[serde(other)]
    Other,
}

impl ClaimSource {
    pub fn from_label(label: &str) -> Self {
        match label {
            "rewardsKernel" => Self::RewardsKernel,
            "minerPool" => Self::MinerPool,
            _ => Self::Other,
        }
    }
}

/// An on-chain claim transfer reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEvent {
    /// Lowercase token contract address.
    pub token: String,
    pub source: ClaimSource,
    #[serde(with = "wei_string")]
    pub amount_wei: u128,
    /// Unix seconds.
    pub timestamp: u64,
    #[serde(default)]
    pub nonce: Option<u64>,
}

/// Indexer response for one wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsSnapshot {
    pub indexing_complete: bool,
    pub claims: Vec<ClaimEvent>,
}

/// Regional GCTL stake and GLW emission for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRewardSnapshot {
    pub week: Week,
    pub region_id: RegionId,
    #[serde(with = "wei_string")]
    pub gctl_staked: u128,
    #[serde(with = "wei_string")]
    pub glw_reward_wei: u128,
}

/// A wallet's GCTL stake in one region for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRegionStake {
    pub week: Week,
    pub region_id: RegionId,
    #[serde(with = "wei_string")]
    pub wallet_staked: u128,
}

/// Fraction purchase kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PurchaseKind {
    Launchpad,
    MiningCenter,
}

/// A locally recorded fraction purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub wallet: WalletAddress,
    pub kind: PurchaseKind,
    #[serde(with = "wei_string")]
    pub amount_glw_wei: u128,
    pub timestamp: u64,
}

/// A locally recorded fraction refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRecord {
    pub wallet: WalletAddress,
    pub kind: PurchaseKind,
    #[serde(with = "wei_string")]
    pub amount_glw_wei: u128,
    pub timestamp: u64,
}

/// End-of-week liquid balance snapshot.
///
/// `forward_filled` marks snapshots copied from an earlier week; those are not
/// trusted as point-in-time values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub week: Week,
    #[serde(with = "wei_string")]
    pub balance_wei: u128,
    #[serde(default)]
    pub forward_filled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_row_counts_only_glw_deposits() {
        let mut row = WalletRewardRow {
            week: 100,
            farm_id: Some("farm-a".to_string()),
            region_id: Some(3),
            asset: Some("glw".to_string()),
            inflation_glw_wei: 5,
            protocol_deposit_received_wei: 7,
        };
        assert_eq!(row.protocol_deposit_glw_wei(), 7);

        row.asset = Some("USDC".to_string());
        assert_eq!(row.protocol_deposit_glw_wei(), 0);

        row.asset = None;
        assert_eq!(row.protocol_deposit_glw_wei(), 0);
    }

    #[test]
    fn test_claim_event_json_shape() {
        let json = r#"{
            "token": "0xf4fbc617a5733eaaf9af08e1ab816b103388d8b6",
            "source": "rewardsKernel",
            "amountWei": "1000000000000000000",
            "timestamp": 1760000000,
            "nonce": 3
        }"#;
        let event: ClaimEvent = serde_json::from_str(json).expect("claim event");
        assert_eq!(event.source, ClaimSource::RewardsKernel);
        assert_eq!(event.amount_wei, 1_000_000_000_000_000_000);
        assert_eq!(event.nonce, Some(3));
    }

    #[test]
    fn test_unknown_claim_source() {
        assert_eq!(ClaimSource::from_label("minerPool"), ClaimSource::MinerPool);
        assert_eq!(ClaimSource::from_label("vesting"), ClaimSource::Other);
        let source: ClaimSource = serde_json::from_str("\"vesting\"").expect("source");
        assert_eq!(source, ClaimSource::Other);
    }

    #[test]
    fn test_purchase_kind_labels() {
        let kind: PurchaseKind = serde_json::from_str("\"mining-center\"").expect("kind");
        assert_eq!(kind, PurchaseKind::MiningCenter);
    }
}
