//! Per-wallet delegation figures for the delegators leaderboard.

use crate::compute::{DelegatedWeek, ScoreContext, WalletInputs, WalletLedgers};
use crate::error::Result;
use glow_types::{ScoreWarnings, WalletAddress, WeekRange};

/// A wallet's vault position over a week range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationSummary {
    pub wallet_address: WalletAddress,
    pub week_range: WeekRange,
    /// Delegated-active GLW at the end week, pending purchases included.
    pub actively_delegated_wei: u128,
    /// Inflation plus GLW protocol-deposit rewards in the end week.
    pub glw_per_week_wei: u128,
    /// Inflation plus GLW protocol-deposit rewards across the range.
    pub gross_rewards_wei: u128,
    /// The wallet's share of principal paid back across the range.
    pub principal_released_wei: u128,
    pub warnings: ScoreWarnings,
}

impl DelegationSummary {
    /// Gross rewards minus principal released. Negative while the position
    /// is still recovering its principal.
    pub fn net_rewards_wei(&self) -> i128 {
        let gross = i128::try_from(self.gross_rewards_wei).unwrap_or(i128::MAX);
        let released = i128::try_from(self.principal_released_wei).unwrap_or(i128::MAX);
        gross.saturating_sub(released)
    }
}

/// Summarizes a wallet's delegation over `ctx.range`.
pub fn summarize_delegation(ctx: &ScoreContext<'_>, inputs: &WalletInputs) -> Result<DelegationSummary> {
    let mut warnings = inputs.warnings.clone();
    let ledgers = WalletLedgers::build(ctx.reconciler, inputs, &mut warnings);
    let range = ctx.range;

    if inputs.excluded {
        return Ok(DelegationSummary {
            wallet_address: inputs.wallet.clone(),
            week_range: range,
            actively_delegated_wei: 0,
            glw_per_week_wei: 0,
            gross_rewards_wei: 0,
            principal_released_wei: 0,
            warnings,
        });
    }

    let mut scan = ctx.vaults.scan(&ledgers.position);
    let delegated = DelegatedWeek::at(&mut scan, &inputs.purchases, range.end_week)?;

    let gross_rewards_wei = range.weeks().fold(0u128, |acc, week| {
        let reward = ledgers.timeline.week(week);
        acc.saturating_add(reward.inflation_glw_wei)
            .saturating_add(reward.protocol_deposit_glw_wei)
    });
    let end = ledgers.timeline.week(range.end_week);

    Ok(DelegationSummary {
        wallet_address: inputs.wallet.clone(),
        week_range: range,
        actively_delegated_wei: delegated.delegated_active_wei(),
        glw_per_week_wei: end.inflation_glw_wei.saturating_add(end.protocol_deposit_glw_wei),
        gross_rewards_wei,
        principal_released_wei: ctx.vaults.principal_released(&ledgers.position, range)?,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steering::{FoundationStakes, RegionRewardsByWeek};
    use glow_ledger::{ReconcilerConfig, VaultLedger};
    use glow_types::{DepositSplitSegment, FarmDistributionRow, FarmPrincipal, WalletRewardRow};

    const GLW: u128 = 1_000_000_000_000_000_000;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x4444444444444444444444444444444444444444").expect("valid")
    }

    fn vaults() -> VaultLedger {
        VaultLedger::from_parts(
            &[FarmPrincipal {
                farm_id: "farm-a".to_string(),
                region_id: Some(2),
                principal_glw_wei: 1_000 * GLW,
            }],
            &[FarmDistributionRow {
                farm_id: "farm-a".to_string(),
                week: 16,
                asset: Some("GLW".to_string()),
                distributed_wei: 200 * GLW,
            }],
            30,
        )
    }

    #[test]
    fn test_net_rewards_subtract_principal_released() {
        let vaults = vaults();
        let region_rewards = RegionRewardsByWeek::new();
        let foundation = FoundationStakes::new();
        let reconciler = ReconcilerConfig::default();
        let ctx = ScoreContext {
            range: WeekRange::new(15, 17).expect("range"),
            current_week: 30,
            vaults: &vaults,
            region_rewards: &region_rewards,
            foundation: &foundation,
            reconciler: &reconciler,
            include_weekly: false,
        };

        let mut inputs = WalletInputs::empty(wallet());
        inputs.splits = vec![DepositSplitSegment {
            farm_id: "farm-a".to_string(),
            start_week: 10,
            end_week: 20,
            split_scaled6: 500_000,
        }];
        inputs.rewards = vec![WalletRewardRow {
            week: 16,
            farm_id: Some("farm-a".to_string()),
            region_id: None,
            asset: Some("GLW".to_string()),
            inflation_glw_wei: 10 * GLW,
            protocol_deposit_received_wei: 100 * GLW,
        }];

        let summary = summarize_delegation(&ctx, &inputs).expect("summary");
        assert_eq!(summary.actively_delegated_wei, 400 * GLW);
        assert_eq!(summary.gross_rewards_wei, 110 * GLW);
        assert_eq!(summary.principal_released_wei, 100 * GLW);
        assert_eq!(summary.net_rewards_wei(), (10 * GLW) as i128);
        assert_eq!(summary.glw_per_week_wei, 0);
    }

    #[test]
    fn test_excluded_wallet_zeroed() {
        let vaults = vaults();
        let region_rewards = RegionRewardsByWeek::new();
        let foundation = FoundationStakes::new();
        let reconciler = ReconcilerConfig::default();
        let ctx = ScoreContext {
            range: WeekRange::new(15, 17).expect("range"),
            current_week: 30,
            vaults: &vaults,
            region_rewards: &region_rewards,
            foundation: &foundation,
            reconciler: &reconciler,
            include_weekly: false,
        };
        let mut inputs = WalletInputs::empty(wallet());
        inputs.excluded = true;
        inputs.splits = vec![DepositSplitSegment {
            farm_id: "farm-a".to_string(),
            start_week: 10,
            end_week: 20,
            split_scaled6: 1_000_000,
        }];

        let summary = summarize_delegation(&ctx, &inputs).expect("summary");
        assert_eq!(summary.actively_delegated_wei, 0);
        assert_eq!(summary.net_rewards_wei(), 0);
    }
}
