//! Scoring results.

use crate::serde_helpers::{points_string, region_points, wei_string};
use crate::{RegionId, WalletAddress, Week, WeekRange};
use glow_primitives::MULTIPLIER_SCALE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A wallet's aggregate GLW position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlowWorth {
    pub wallet_address: WalletAddress,
    #[serde(with = "wei_string")]
    pub liquid_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub delegated_active_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub unclaimed_glw_rewards_wei: u128,
    #[serde(with = "wei_string")]
    pub pending_recovered_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub glow_worth_wei: u128,
}

impl GlowWorth {
    pub fn new(
        wallet_address: WalletAddress,
        liquid_glw_wei: u128,
        delegated_active_glw_wei: u128,
        unclaimed_glw_rewards_wei: u128,
        pending_recovered_glw_wei: u128,
    ) -> Self {
        let glow_worth_wei = liquid_glw_wei
            .saturating_add(delegated_active_glw_wei)
            .saturating_add(unclaimed_glw_rewards_wei)
            .saturating_add(pending_recovered_glw_wei);
        Self {
            wallet_address,
            liquid_glw_wei,
            delegated_active_glw_wei,
            unclaimed_glw_rewards_wei,
            pending_recovered_glw_wei,
            glow_worth_wei,
        }
    }

    pub fn zero(wallet_address: WalletAddress) -> Self {
        Self::new(wallet_address, 0, 0, 0, 0)
    }
}

/// One week of a wallet's score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyImpactRow {
    pub week: Week,

    #[serde(with = "wei_string")]
    pub inflation_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub steering_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub delegated_active_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub protocol_deposit_recovered_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub liquid_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub unclaimed_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub pending_recovered_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub glow_worth_glw_wei: u128,

    #[serde(with = "points_string")]
    pub inflation_points: u128,
    #[serde(with = "points_string")]
    pub steering_points: u128,
    #[serde(with = "points_string")]
    pub vault_bonus_points: u128,
    #[serde(with = "points_string")]
    pub rollover_points_pre_multiplier: u128,
    #[serde(with = "points_string")]
    pub rollover_points: u128,
    #[serde(with = "points_string")]
    pub continuous_points: u128,
    #[serde(with = "points_string")]
    pub total_points: u128,

    pub has_cash_miner_bonus: bool,
    #[serde(with = "points_string")]
    pub base_multiplier: u128,
    #[serde(with = "points_string")]
    pub streak_bonus_multiplier: u128,
    #[serde(with = "points_string")]
    pub total_multiplier: u128,
    pub impact_streak_weeks: u32,
}

impl WeeklyImpactRow {
    /// Zero-valued row for `week` at a neutral 1.0x multiplier.
    pub fn zeroed(week: Week) -> Self {
        Self {
            week,
            base_multiplier: MULTIPLIER_SCALE,
            total_multiplier: MULTIPLIER_SCALE,
            ..Self::default()
        }
    }
}

/// Cumulative totals over the requested range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTotals {
    #[serde(with = "points_string")]
    pub total_points: u128,
    #[serde(with = "points_string")]
    pub rollover_points: u128,
    #[serde(with = "points_string")]
    pub continuous_points: u128,
    #[serde(with = "points_string")]
    pub inflation_points: u128,
    #[serde(with = "points_string")]
    pub steering_points: u128,
    #[serde(with = "points_string")]
    pub vault_bonus_points: u128,
    #[serde(with = "wei_string")]
    pub total_inflation_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub total_steering_glw_wei: u128,
}

/// Post-multiplier points by category. Sums to `totals.total_points` up to rounding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComposition {
    #[serde(with = "points_string")]
    pub steering_points: u128,
    #[serde(with = "points_string")]
    pub inflation_points: u128,
    #[serde(with = "points_string")]
    pub worth_points: u128,
    #[serde(with = "points_string")]
    pub vault_points: u128,
}

/// Degradation notes attached to a successful but approximate result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWarnings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steering: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unclaimed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewards: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchases: Option<String>,
}

impl ScoreWarnings {
    pub fn is_empty(&self) -> bool {
        self.steering.is_none()
            && self.unclaimed.is_none()
            && self.liquid.is_none()
            && self.rewards.is_none()
            && self.vault.is_none()
            && self.purchases.is_none()
    }
}

/// Full score for one wallet over one week range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlowImpactScoreResult {
    pub wallet_address: WalletAddress,
    pub week_range: WeekRange,
    pub glow_worth: GlowWorth,
    pub totals: ScoreTotals,
    pub composition: ScoreComposition,
    /// Total for the final completed week only.
    #[serde(with = "points_string")]
    pub last_week_points: u128,
    pub active_multiplier: bool,
    #[serde(with = "points_string")]
    pub end_week_multiplier: u128,
    pub has_miner_multiplier: bool,
    pub has_steering_stake: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weekly: Vec<WeeklyImpactRow>,
    #[serde(default, with = "region_points")]
    pub points_per_region: BTreeMap<RegionId, u128>,
    #[serde(default, skip_serializing_if = "ScoreWarnings::is_empty")]
    pub warnings: ScoreWarnings,
}

impl GlowImpactScoreResult {
    /// Replaces every value with zero while keeping the result's shape:
    /// the same weeks, the same regions, a neutral multiplier.
    pub fn zero_out(&mut self) {
        self.glow_worth = GlowWorth::zero(self.wallet_address.clone());
        self.totals = ScoreTotals::default();
        self.composition = ScoreComposition::default();
        self.last_week_points = 0;
        self.active_multiplier = false;
        self.end_week_multiplier = MULTIPLIER_SCALE;
        self.has_miner_multiplier = false;
        self.has_steering_stake = false;
        for row in &mut self.weekly {
            *row = WeeklyImpactRow::zeroed(row.week);
        }
        for points in self.points_per_region.values_mut() {
            *points = 0;
        }
    }
}

/// Projected score for the in-progress week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeekProjection {
    pub week: Week,
    pub has_miner_multiplier: bool,
    pub has_steering_stake: bool,
    pub impact_streak_weeks: u32,
    #[serde(with = "points_string")]
    pub base_multiplier: u128,
    #[serde(with = "points_string")]
    pub streak_bonus_multiplier: u128,
    #[serde(with = "points_string")]
    pub total_multiplier: u128,
    #[serde(with = "wei_string")]
    pub steering_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub inflation_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub delegated_glw_wei: u128,
    #[serde(with = "wei_string")]
    pub glow_worth_wei: u128,
    #[serde(with = "points_string")]
    pub total_projected_points: u128,
}
