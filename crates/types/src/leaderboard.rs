//! Persisted leaderboard projections.

use crate::score::ScoreComposition;
use crate::serde_helpers::{points_string, region_points, signed_wei_string, wei_string};
use crate::{RegionId, TypesError, WalletAddress, WeekRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key a leaderboard is ranked by (descending).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaderboardSortKey {
    #[default]
    TotalPoints,
    GlowWorth,
    LastWeekPoints,
    SteeringPoints,
    InflationPoints,
    VaultPoints,
    WorthPoints,
}

impl LeaderboardSortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalPoints => "totalPoints",
            Self::GlowWorth => "glowWorth",
            Self::LastWeekPoints => "lastWeekPoints",
            Self::SteeringPoints => "steeringPoints",
            Self::InflationPoints => "inflationPoints",
            Self::VaultPoints => "vaultPoints",
            Self::WorthPoints => "worthPoints",
        }
    }
}

impl fmt::Display for LeaderboardSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaderboardSortKey {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "totalPoints" => Ok(Self::TotalPoints),
            "glowWorth" => Ok(Self::GlowWorth),
            "lastWeekPoints" => Ok(Self::LastWeekPoints),
            "steeringPoints" => Ok(Self::SteeringPoints),
            "inflationPoints" => Ok(Self::InflationPoints),
            "vaultPoints" => Ok(Self::VaultPoints),
            "worthPoints" => Ok(Self::WorthPoints),
            other => Err(TypesError::InvalidSortKey(other.to_string())),
        }
    }
}

/// Display flags carried on each leaderboard row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardFlags {
    pub active_multiplier: bool,
    pub has_miner_multiplier: bool,
    pub has_steering_stake: bool,
    pub has_vault_bonus: bool,
    #[serde(with = "points_string")]
    pub end_week_multiplier: u128,
}

/// One ranked wallet in the impact leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: u32,
    pub wallet_address: WalletAddress,
    pub week_range: WeekRange,
    #[serde(with = "points_string")]
    pub total_points: u128,
    #[serde(with = "wei_string")]
    pub glow_worth_wei: u128,
    #[serde(with = "points_string")]
    pub last_week_points: u128,
    pub composition: ScoreComposition,
    pub flags: LeaderboardFlags,
    #[serde(default, with = "region_points")]
    pub points_per_region: BTreeMap<RegionId, u128>,
}

/// System row stored next to the ranked rows: points per region summed over
/// every ranked wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionTotalsRow {
    #[serde(with = "region_points")]
    pub global_region_totals: BTreeMap<RegionId, u128>,
}

/// One ranked wallet in the delegators leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatorRow {
    pub rank: u32,
    pub wallet_address: WalletAddress,
    pub week_range: WeekRange,
    #[serde(with = "wei_string")]
    pub actively_delegated_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub glw_per_week_wei: u128,
    /// Gross rewards minus principal released; negative while a position is
    /// still being recovered.
    #[serde(with = "signed_wei_string")]
    pub net_rewards_wei: i128,
    /// Share of all actively delegated GLW, scaled6 percent (`"12.500000"` = 12.5%).
    #[serde(with = "points_string")]
    pub share_percent: u128,
}

/// A complete impact leaderboard as persisted: ranked rows plus the region
/// totals system row, replaced as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactLeaderboardSnapshot {
    pub week_range: WeekRange,
    pub rows: Vec<LeaderboardRow>,
    pub region_totals: RegionTotalsRow,
    /// Unix seconds when the snapshot was computed.
    pub computed_at: u64,
}

/// A complete delegators leaderboard as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatorsSnapshot {
    pub week_range: WeekRange,
    pub rows: Vec<DelegatorRow>,
    pub computed_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(
            "glowWorth".parse::<LeaderboardSortKey>(),
            Ok(LeaderboardSortKey::GlowWorth)
        );
        assert!("bogus".parse::<LeaderboardSortKey>().is_err());
        assert_eq!(LeaderboardSortKey::default().to_string(), "totalPoints");
    }

    #[test]
    fn test_delegator_row_signed_rewards() {
        let row = DelegatorRow {
            rank: 1,
            wallet_address: WalletAddress::parse("0x2222222222222222222222222222222222222222")
                .expect("wallet"),
            week_range: WeekRange::new(97, 100).expect("range"),
            actively_delegated_glw_wei: 10,
            glw_per_week_wei: 1,
            net_rewards_wei: -5,
            share_percent: 12_500_000,
        };
        let value = serde_json::to_value(&row).expect("serialize");
        assert_eq!(value["netRewardsWei"], "-5");
        assert_eq!(value["sharePercent"], "12.500000");
    }
}
