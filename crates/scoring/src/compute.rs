//! Pure per-wallet score computation.
//!
//! Everything here runs on data already fetched by the engine; no I/O.

use crate::error::Result;
use crate::multiplier::{
    StreakTracker, WeekMultiplier, GLOW_WORTH_POINTS_PER_GLW_SCALED6,
    INFLATION_POINTS_PER_GLW_SCALED6, VAULT_BONUS_POINTS_PER_GLW_SCALED6,
};
use crate::steering::{steering_week, FoundationStakes, RegionRewardsByWeek, WalletStakesByWeek};
use glow_ledger::{
    pending_delegated, ClaimReconciliation, LedgerError, PurchaseLedger, ReconcilerConfig,
    RewardTimeline, UnclaimedBreakdown, VaultLedger, VaultScan, VaultWeek, WalletPosition,
};
use glow_primitives::{
    apply_multiplier_scaled6, glw_wei_to_points_scaled6, mul_div, MULTIPLIER_SCALE,
};
use glow_types::{
    BalanceSnapshot, ClaimsSnapshot, DepositSplitSegment, GlowImpactScoreResult, GlowWorth,
    RegionId, ScoreComposition, ScoreTotals, ScoreWarnings, WalletAddress, WalletRewardRow, Week,
    WeekRange, WeeklyImpactRow, UNASSIGNED_REGION,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Weeks before the range start that only seed the streak.
pub const STREAK_LOOKBACK_WEEKS: Week = 4;

/// Data shared by every wallet in a batch.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    /// Weeks being scored.
    pub range: WeekRange,
    /// Week in progress when the batch started.
    pub current_week: Week,
    /// Farm vaults with the finalized week.
    pub vaults: &'a VaultLedger,
    /// Regional stake and emission per week.
    pub region_rewards: &'a RegionRewardsByWeek,
    /// Foundation stake per week and region.
    pub foundation: &'a FoundationStakes,
    /// Claim matching parameters.
    pub reconciler: &'a ReconcilerConfig,
    /// Keep the weekly breakdown in the result.
    pub include_weekly: bool,
}

/// Everything fetched for one wallet.
#[derive(Debug, Clone)]
pub struct WalletInputs {
    pub wallet: WalletAddress,
    /// Reward rows from the first v2 week through the current week.
    pub rewards: Vec<WalletRewardRow>,
    pub splits: Vec<DepositSplitSegment>,
    /// `None` when the claims fetch failed.
    pub claims: Option<ClaimsSnapshot>,
    pub stakes: WalletStakesByWeek,
    pub purchases: PurchaseLedger,
    pub balances: BTreeMap<Week, BalanceSnapshot>,
    pub live_balance_wei: u128,
    /// Protocol-owned wallets are scored and then zeroed.
    pub excluded: bool,
    /// Degradations recorded while fetching.
    pub warnings: ScoreWarnings,
}

impl WalletInputs {
    /// Inputs with no data at all.
    pub fn empty(wallet: WalletAddress) -> Self {
        Self {
            wallet,
            rewards: Vec::new(),
            splits: Vec::new(),
            claims: None,
            stakes: WalletStakesByWeek::new(),
            purchases: PurchaseLedger::default(),
            balances: BTreeMap::new(),
            live_balance_wei: 0,
            excluded: false,
            warnings: ScoreWarnings::default(),
        }
    }
}

/// Ledger state derived from a wallet's inputs, shared by scoring and projection.
pub(crate) struct WalletLedgers {
    pub position: WalletPosition,
    pub timeline: RewardTimeline,
    pub claims: Option<ClaimReconciliation>,
}

impl WalletLedgers {
    pub(crate) fn build(
        reconciler: &ReconcilerConfig,
        inputs: &WalletInputs,
        warnings: &mut ScoreWarnings,
    ) -> Self {
        let position = WalletPosition::new(inputs.splits.iter().cloned()).unwrap_or_else(|e| {
            warn!(wallet = %inputs.wallet, error = %e, "rejecting deposit split history");
            warnings.vault = Some(format!("deposit split history rejected: {e}"));
            WalletPosition::default()
        });

        let timeline = RewardTimeline::from_rows(&inputs.rewards);

        let claims = match &inputs.claims {
            Some(snapshot) => match ClaimReconciliation::reconcile(reconciler, &timeline, snapshot) {
                Ok(claims) => Some(claims),
                Err(LedgerError::IndexingIncomplete) => {
                    warnings.unclaimed = Some("claims indexer is still indexing".to_string());
                    None
                }
                Err(e) => {
                    warnings.unclaimed = Some(format!("claims reconciliation failed: {e}"));
                    None
                }
            },
            None => {
                if warnings.unclaimed.is_none() {
                    warnings.unclaimed = Some("claims unavailable".to_string());
                }
                None
            }
        };

        Self {
            position,
            timeline,
            claims,
        }
    }

    pub(crate) fn unclaimed_as_of(&self, reconciler: &ReconcilerConfig, week: Week) -> UnclaimedBreakdown {
        self.claims
            .as_ref()
            .map(|claims| claims.as_of(reconciler, &self.timeline, week))
            .unwrap_or_default()
    }

    pub(crate) fn unclaimed_now(&self, reconciler: &ReconcilerConfig, current_week: Week) -> UnclaimedBreakdown {
        self.claims
            .as_ref()
            .map(|claims| claims.snapshot(reconciler, &self.timeline, current_week))
            .unwrap_or_default()
    }
}

/// Delegated position for one week after pending-purchase smoothing.
pub(crate) struct DelegatedWeek {
    pub vault: VaultWeek,
    pub pending_wei: u128,
}

/// Streak tracker primed with the position the week before `first_week`.
pub(crate) fn seeded_streak(
    scan: &mut VaultScan<'_>,
    purchases: &PurchaseLedger,
    first_week: Week,
) -> Result<StreakTracker> {
    let mut streak = StreakTracker::new();
    if let Some(seed_week) = first_week.checked_sub(1) {
        streak.seed(DelegatedWeek::at(scan, purchases, seed_week)?.effective_gross_wei());
    }
    Ok(streak)
}

impl DelegatedWeek {
    pub(crate) fn at(scan: &mut VaultScan<'_>, purchases: &PurchaseLedger, week: Week) -> Result<Self> {
        let vault = scan.week(week)?;
        let pending_wei =
            pending_delegated(purchases.cumulative_net_through(week), vault.gross_share_wei);
        Ok(Self { vault, pending_wei })
    }

    pub(crate) fn delegated_active_wei(&self) -> u128 {
        self.vault.delegated_active_wei.saturating_add(self.pending_wei)
    }

    pub(crate) fn effective_gross_wei(&self) -> u128 {
        self.vault.gross_share_wei.saturating_add(self.pending_wei)
    }
}

/// Splits `total` across regions in proportion to `weights`.
///
/// The rounding remainder goes to the heaviest region so the parts always
/// sum to `total`. With no positive weight everything lands in region 0.
pub fn distribute_by_weight(total: u128, weights: &BTreeMap<RegionId, u128>) -> BTreeMap<RegionId, u128> {
    let mut out = BTreeMap::new();
    if total == 0 {
        return out;
    }
    let weight_sum = weights.values().fold(0u128, |acc, w| acc.saturating_add(*w));
    if weight_sum == 0 {
        out.insert(UNASSIGNED_REGION, total);
        return out;
    }

    let mut assigned = 0u128;
    let mut heaviest: Option<(RegionId, u128)> = None;
    for (region, weight) in weights.iter().filter(|(_, w)| **w > 0) {
        let part = mul_div(total, *weight, weight_sum);
        assigned = assigned.saturating_add(part);
        out.insert(*region, part);
        if heaviest.map_or(true, |(_, w)| *weight > w) {
            heaviest = Some((*region, *weight));
        }
    }
    if let Some((region, _)) = heaviest {
        if let Some(part) = out.get_mut(&region) {
            *part = part.saturating_add(total.saturating_sub(assigned));
        }
    }
    out.retain(|_, points| *points > 0);
    out
}

fn merge_regions(into: &mut BTreeMap<RegionId, u128>, from: BTreeMap<RegionId, u128>) {
    for (region, points) in from {
        let entry = into.entry(region).or_insert(0);
        *entry = entry.saturating_add(points);
    }
}

/// Inflation received per region, grouped by week.
fn inflation_regions(
    rows: &[WalletRewardRow],
    vaults: &VaultLedger,
) -> BTreeMap<Week, BTreeMap<RegionId, u128>> {
    let mut out: BTreeMap<Week, BTreeMap<RegionId, u128>> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.inflation_glw_wei > 0) {
        let region = row
            .region_id
            .or_else(|| row.farm_id.as_deref().and_then(|f| vaults.farm_region(f)))
            .unwrap_or(UNASSIGNED_REGION);
        let entry = out.entry(row.week).or_default().entry(region).or_insert(0);
        *entry = entry.saturating_add(row.inflation_glw_wei);
    }
    out
}

/// Week whose points are reported as `lastWeekPoints`.
pub fn last_week_points_week(range: WeekRange, current_week: Week) -> Week {
    if range.end_week >= current_week {
        range.end_week.saturating_sub(1)
    } else {
        range.end_week
    }
}

/// Liquid GLW at the end of `week`: a genuine snapshot, else the live balance.
fn liquid_at(balances: &BTreeMap<Week, BalanceSnapshot>, week: Week, live_balance_wei: u128) -> u128 {
    balances
        .get(&week)
        .filter(|snapshot| !snapshot.forward_filled)
        .map(|snapshot| snapshot.balance_wei)
        .unwrap_or(live_balance_wei)
}

/// Computes a wallet's impact score over `ctx.range`.
///
/// Weeks are walked strictly ascending from four weeks before the range so
/// the streak is seeded; only weeks inside the range earn points.
pub fn score_wallet(ctx: &ScoreContext<'_>, inputs: WalletInputs) -> Result<GlowImpactScoreResult> {
    let mut warnings = inputs.warnings.clone();
    let ledgers = WalletLedgers::build(ctx.reconciler, &inputs, &mut warnings);
    let inflation_by_region = inflation_regions(&inputs.rewards, ctx.vaults);

    let mut scan = ctx.vaults.scan(&ledgers.position);
    let scanned = ctx.range.with_lookback(STREAK_LOOKBACK_WEEKS);
    let mut streak = seeded_streak(&mut scan, &inputs.purchases, scanned.start_week)?;
    let mut totals = ScoreTotals::default();
    let mut composition = ScoreComposition::default();
    let mut points_per_region: BTreeMap<RegionId, u128> = BTreeMap::new();
    let mut weekly = Vec::with_capacity(ctx.range.len() as usize);
    let mut has_miner_multiplier = false;
    let mut end_week_multiplier = MULTIPLIER_SCALE;
    let no_regions = Vec::new();

    for week in scanned.weeks() {
        let delegated = DelegatedWeek::at(&mut scan, &inputs.purchases, week)?;
        let has_cash_miner = inputs.purchases.has_mining_center_purchase(week);
        let multiplier = streak.observe(delegated.effective_gross_wei(), has_cash_miner);
        if week < ctx.range.start_week {
            continue;
        }

        let reward = ledgers.timeline.week(week);
        let region_rewards = ctx.region_rewards.get(&week).unwrap_or(&no_regions);
        let stakes = inputs.stakes.get(&week).map(Vec::as_slice).unwrap_or(&[]);
        let steering = steering_week(week, stakes, region_rewards, ctx.foundation);

        let delegated_active_wei = delegated.delegated_active_wei();
        let inflation_points =
            glw_wei_to_points_scaled6(reward.inflation_glw_wei, INFLATION_POINTS_PER_GLW_SCALED6);
        let steering_points = steering.points_scaled6;
        let vault_bonus_points =
            glw_wei_to_points_scaled6(delegated_active_wei, VAULT_BONUS_POINTS_PER_GLW_SCALED6);
        let rollover_points_pre_multiplier = inflation_points
            .saturating_add(steering_points)
            .saturating_add(vault_bonus_points);
        let rollover_points =
            apply_multiplier_scaled6(rollover_points_pre_multiplier, multiplier.total_scaled6);

        let liquid_glw_wei = liquid_at(&inputs.balances, week, inputs.live_balance_wei);
        let unclaimed = ledgers.unclaimed_as_of(ctx.reconciler, week);
        let glow_worth_glw_wei = liquid_glw_wei
            .saturating_add(delegated_active_wei)
            .saturating_add(unclaimed.unclaimed_wei)
            .saturating_add(unclaimed.pending_recovered_wei);
        let continuous_points = apply_multiplier_scaled6(
            glw_wei_to_points_scaled6(glow_worth_glw_wei, GLOW_WORTH_POINTS_PER_GLW_SCALED6),
            multiplier.total_scaled6,
        );
        let total_points = rollover_points.saturating_add(continuous_points);

        // Post-multiplier buckets; vault absorbs the rounding so the parts sum to rollover.
        let steering_post = apply_multiplier_scaled6(steering_points, multiplier.total_scaled6);
        let inflation_post = apply_multiplier_scaled6(inflation_points, multiplier.total_scaled6);
        let vault_post = rollover_points
            .saturating_sub(steering_post)
            .saturating_sub(inflation_post);

        composition.steering_points = composition.steering_points.saturating_add(steering_post);
        composition.inflation_points = composition.inflation_points.saturating_add(inflation_post);
        composition.vault_points = composition.vault_points.saturating_add(vault_post);
        composition.worth_points = composition.worth_points.saturating_add(continuous_points);

        let steering_weights = steering
            .by_region
            .iter()
            .map(|(region, s)| (*region, s.points_scaled6))
            .collect();
        let mut vault_weights: BTreeMap<RegionId, u128> = BTreeMap::new();
        for farm in &delegated.vault.farms {
            let entry = vault_weights
                .entry(farm.region_id.unwrap_or(UNASSIGNED_REGION))
                .or_insert(0);
            *entry = entry.saturating_add(farm.delegated_active_wei);
        }
        if delegated.pending_wei > 0 {
            let entry = vault_weights.entry(UNASSIGNED_REGION).or_insert(0);
            *entry = entry.saturating_add(delegated.pending_wei);
        }
        let emission_weights = region_rewards
            .iter()
            .map(|r| (r.region_id, r.glw_reward_wei))
            .collect();
        let empty = BTreeMap::new();
        merge_regions(
            &mut points_per_region,
            distribute_by_weight(inflation_post, inflation_by_region.get(&week).unwrap_or(&empty)),
        );
        merge_regions(&mut points_per_region, distribute_by_weight(steering_post, &steering_weights));
        merge_regions(&mut points_per_region, distribute_by_weight(vault_post, &vault_weights));
        merge_regions(
            &mut points_per_region,
            distribute_by_weight(continuous_points, &emission_weights),
        );

        totals.total_points = totals.total_points.saturating_add(total_points);
        totals.rollover_points = totals.rollover_points.saturating_add(rollover_points);
        totals.continuous_points = totals.continuous_points.saturating_add(continuous_points);
        totals.inflation_points = totals.inflation_points.saturating_add(inflation_points);
        totals.steering_points = totals.steering_points.saturating_add(steering_points);
        totals.vault_bonus_points = totals.vault_bonus_points.saturating_add(vault_bonus_points);
        totals.total_inflation_glw_wei = totals
            .total_inflation_glw_wei
            .saturating_add(reward.inflation_glw_wei);
        totals.total_steering_glw_wei = totals
            .total_steering_glw_wei
            .saturating_add(steering.steered_glw_wei);

        has_miner_multiplier |= multiplier.has_cash_miner_bonus;
        end_week_multiplier = multiplier.total_scaled6;

        weekly.push(weekly_row(
            week,
            &multiplier,
            WeeklyImpactRow {
                inflation_glw_wei: reward.inflation_glw_wei,
                steering_glw_wei: steering.steered_glw_wei,
                delegated_active_glw_wei: delegated_active_wei,
                protocol_deposit_recovered_glw_wei: reward.protocol_deposit_glw_wei,
                liquid_glw_wei,
                unclaimed_glw_wei: unclaimed.unclaimed_wei,
                pending_recovered_glw_wei: unclaimed.pending_recovered_wei,
                glow_worth_glw_wei,
                inflation_points,
                steering_points,
                vault_bonus_points,
                rollover_points_pre_multiplier,
                rollover_points,
                continuous_points,
                total_points,
                ..WeeklyImpactRow::default()
            },
        ));
    }

    let last_week = last_week_points_week(ctx.range, ctx.current_week);
    let last_week_points = weekly
        .iter()
        .find(|row| row.week == last_week)
        .map(|row| row.total_points)
        .unwrap_or(0);

    let glow_worth = current_glow_worth(ctx, &inputs, &ledgers)?;

    debug!(
        wallet = %inputs.wallet,
        total_points = totals.total_points,
        glow_worth_wei = glow_worth.glow_worth_wei,
        "wallet scored"
    );

    let mut result = GlowImpactScoreResult {
        wallet_address: inputs.wallet.clone(),
        week_range: ctx.range,
        glow_worth,
        has_steering_stake: totals.total_steering_glw_wei > 0,
        totals,
        composition,
        last_week_points,
        active_multiplier: end_week_multiplier > MULTIPLIER_SCALE,
        end_week_multiplier,
        has_miner_multiplier,
        weekly: if ctx.include_weekly { weekly } else { Vec::new() },
        points_per_region,
        warnings,
    };

    if inputs.excluded {
        result.zero_out();
    }
    Ok(result)
}

fn weekly_row(week: Week, multiplier: &WeekMultiplier, row: WeeklyImpactRow) -> WeeklyImpactRow {
    WeeklyImpactRow {
        week,
        has_cash_miner_bonus: multiplier.has_cash_miner_bonus,
        base_multiplier: multiplier.base_scaled6,
        streak_bonus_multiplier: multiplier.streak_bonus_scaled6,
        total_multiplier: multiplier.total_scaled6,
        impact_streak_weeks: multiplier.impact_streak_weeks,
        ..row
    }
}

/// GlowWorth as of now: live liquid balance, delegated-active at the current
/// week and the reconciler's current unclaimed figures.
fn current_glow_worth(
    ctx: &ScoreContext<'_>,
    inputs: &WalletInputs,
    ledgers: &WalletLedgers,
) -> Result<GlowWorth> {
    let mut scan = ctx.vaults.scan(&ledgers.position);
    let delegated = DelegatedWeek::at(&mut scan, &inputs.purchases, ctx.current_week)?;
    let unclaimed = ledgers.unclaimed_now(ctx.reconciler, ctx.current_week);
    Ok(GlowWorth::new(
        inputs.wallet.clone(),
        inputs.live_balance_wei,
        delegated.delegated_active_wei(),
        unclaimed.unclaimed_wei,
        unclaimed.pending_recovered_wei,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_types::{
        ClaimEvent, ClaimSource, FarmDistributionRow, FarmPrincipal, PurchaseKind, PurchaseRecord,
        RegionRewardSnapshot, WalletRegionStake,
    };
    use glow_primitives::week_start_timestamp;

    const GLW: u128 = 1_000_000_000_000_000_000;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x1111111111111111111111111111111111111111").expect("valid")
    }

    fn reward(week: Week, inflation: u128) -> WalletRewardRow {
        WalletRewardRow {
            week,
            farm_id: None,
            region_id: Some(2),
            asset: Some("GLW".to_string()),
            inflation_glw_wei: inflation,
            protocol_deposit_received_wei: 0,
        }
    }

    struct Fixture {
        vaults: VaultLedger,
        region_rewards: RegionRewardsByWeek,
        foundation: FoundationStakes,
        reconciler: ReconcilerConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                vaults: VaultLedger::new(200),
                region_rewards: RegionRewardsByWeek::new(),
                foundation: FoundationStakes::new(),
                reconciler: ReconcilerConfig::default(),
            }
        }

        fn ctx(&self, range: WeekRange, current_week: Week) -> ScoreContext<'_> {
            ScoreContext {
                range,
                current_week,
                vaults: &self.vaults,
                region_rewards: &self.region_rewards,
                foundation: &self.foundation,
                reconciler: &self.reconciler,
                include_weekly: true,
            }
        }
    }

    fn complete_claims() -> Option<ClaimsSnapshot> {
        Some(ClaimsSnapshot {
            indexing_complete: true,
            claims: Vec::new(),
        })
    }

    #[test]
    fn test_inflation_only_wallet() {
        let fixture = Fixture::new();
        let range = WeekRange::new(100, 101).expect("range");
        let mut inputs = WalletInputs::empty(wallet());
        inputs.rewards = vec![reward(100, 10 * GLW)];
        inputs.claims = complete_claims();

        let result = score_wallet(&fixture.ctx(range, 110), inputs).expect("score");
        assert_eq!(result.totals.inflation_points, 10_000_000);
        assert_eq!(result.totals.total_inflation_glw_wei, 10 * GLW);
        // Week 100: 10 points inflation, no worth yet (lag not reached).
        assert_eq!(result.weekly[0].total_points, 10_000_000);
        assert_eq!(result.weekly[0].total_multiplier, 1_000_000);
        // Week 101: nothing earned.
        assert_eq!(result.weekly[1].total_points, 0);
        assert_eq!(result.last_week_points, 0);
        assert_eq!(result.points_per_region.get(&2), Some(&10_000_000));
        // Unclaimed inflation counts in GlowWorth today.
        assert_eq!(result.glow_worth.unclaimed_glw_rewards_wei, 10 * GLW);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_continuous_points_from_liquid_balance() {
        let fixture = Fixture::new();
        let range = WeekRange::new(100, 100).expect("range");
        let mut inputs = WalletInputs::empty(wallet());
        inputs.claims = complete_claims();
        inputs.live_balance_wei = 1_000 * GLW;

        let result = score_wallet(&fixture.ctx(range, 110), inputs).expect("score");
        assert_eq!(result.totals.continuous_points, 1_000_000);
        assert_eq!(result.composition.worth_points, 1_000_000);
        assert_eq!(result.points_per_region.get(&UNASSIGNED_REGION), Some(&1_000_000));
        assert_eq!(result.glow_worth.liquid_glw_wei, 1_000 * GLW);
    }

    #[test]
    fn test_genuine_snapshot_beats_live_balance() {
        let fixture = Fixture::new();
        let range = WeekRange::new(100, 101).expect("range");
        let mut inputs = WalletInputs::empty(wallet());
        inputs.claims = complete_claims();
        inputs.live_balance_wei = 1_000 * GLW;
        inputs.balances.insert(
            100,
            BalanceSnapshot {
                week: 100,
                balance_wei: 2_000 * GLW,
                forward_filled: false,
            },
        );
        inputs.balances.insert(
            101,
            BalanceSnapshot {
                week: 101,
                balance_wei: 5_000 * GLW,
                forward_filled: true,
            },
        );

        let result = score_wallet(&fixture.ctx(range, 110), inputs).expect("score");
        assert_eq!(result.weekly[0].liquid_glw_wei, 2_000 * GLW);
        assert_eq!(result.weekly[1].liquid_glw_wei, 1_000 * GLW);
    }

    #[test]
    fn test_vault_bonus_and_streak() {
        let mut fixture = Fixture::new();
        let principal = FarmPrincipal {
            farm_id: "farm-1".to_string(),
            region_id: Some(4),
            principal_glw_wei: 1_000 * GLW,
        };
        let distributions = vec![FarmDistributionRow {
            farm_id: "farm-1".to_string(),
            week: 103,
            asset: Some("GLW".to_string()),
            distributed_wei: 200 * GLW,
        }];
        fixture.vaults = VaultLedger::from_parts(&[principal], &distributions, 200);

        let range = WeekRange::new(102, 104).expect("range");
        let mut inputs = WalletInputs::empty(wallet());
        inputs.claims = complete_claims();
        inputs.splits = vec![DepositSplitSegment {
            farm_id: "farm-1".to_string(),
            start_week: 102,
            end_week: 120,
            split_scaled6: 500_000,
        }];

        let result = score_wallet(&fixture.ctx(range, 110), inputs).expect("score");
        let weeks = &result.weekly;
        assert_eq!(weeks[0].delegated_active_glw_wei, 500 * GLW);
        // First week with a share starts the streak.
        assert_eq!(weeks[0].impact_streak_weeks, 1);
        assert_eq!(weeks[0].total_multiplier, 1_250_000);
        // 500 GLW * 0.005 = 2.5 points, * 1.25.
        assert_eq!(weeks[0].vault_bonus_points, 2_500_000);
        assert_eq!(weeks[0].rollover_points, 3_125_000);
        // Distribution lowers delegated-active but not the gross share; streak resets.
        assert_eq!(weeks[1].delegated_active_glw_wei, 400 * GLW);
        assert_eq!(weeks[1].impact_streak_weeks, 0);
        assert_eq!(result.end_week_multiplier, 1_000_000);
        assert!(!result.active_multiplier);
        assert_eq!(result.glow_worth.delegated_active_glw_wei, 400 * GLW);
        assert!(result.points_per_region.contains_key(&4));
    }

    #[test]
    fn test_position_held_before_lookback_is_not_an_increase() {
        let mut fixture = Fixture::new();
        let farms: Vec<String> = (0..5).map(|i| format!("farm-{i}")).collect();
        let principals: Vec<FarmPrincipal> = farms
            .iter()
            .map(|farm_id| FarmPrincipal {
                farm_id: farm_id.clone(),
                region_id: Some(4),
                principal_glw_wei: 100 * GLW,
            })
            .collect();
        fixture.vaults = VaultLedger::from_parts(&principals, &[], 200);

        // farm-0 held since week 90, one more farm each week from 97 to 100.
        let mut inputs = WalletInputs::empty(wallet());
        inputs.claims = complete_claims();
        inputs.splits = farms
            .iter()
            .zip([90, 97, 98, 99, 100])
            .map(|(farm_id, start_week)| DepositSplitSegment {
                farm_id: farm_id.clone(),
                start_week,
                end_week: 120,
                split_scaled6: 1_000_000,
            })
            .collect();

        let range = WeekRange::new(100, 100).expect("range");
        let result = score_wallet(&fixture.ctx(range, 110), inputs).expect("score");
        // Week 96 matches week 95, so only 97 through 100 extend the streak.
        assert_eq!(result.weekly[0].impact_streak_weeks, 4);
        assert_eq!(result.end_week_multiplier, 2_000_000);
    }

    #[test]
    fn test_mining_center_purchase_triples_base() {
        let fixture = Fixture::new();
        let range = WeekRange::new(100, 100).expect("range");
        let mut inputs = WalletInputs::empty(wallet());
        inputs.claims = complete_claims();
        inputs.rewards = vec![reward(100, GLW)];
        inputs.purchases = PurchaseLedger::from_records(
            &[PurchaseRecord {
                wallet: wallet(),
                kind: PurchaseKind::MiningCenter,
                amount_glw_wei: 0,
                timestamp: week_start_timestamp(100) + 60,
            }],
            &[],
        );

        let result = score_wallet(&fixture.ctx(range, 110), inputs).expect("score");
        assert!(result.has_miner_multiplier);
        assert_eq!(result.end_week_multiplier, 3_250_000);
        assert_eq!(result.totals.rollover_points, 3_250_000);
        assert!(result.active_multiplier);
    }

    #[test]
    fn test_steering_points_with_foundation_boost() {
        let mut fixture = Fixture::new();
        fixture.region_rewards.insert(
            100,
            vec![RegionRewardSnapshot {
                week: 100,
                region_id: 1,
                gctl_staked: 200,
                glw_reward_wei: 200 * GLW,
            }],
        );
        fixture.foundation.insert((100, 1), 60);

        let range = WeekRange::new(100, 100).expect("range");
        let mut inputs = WalletInputs::empty(wallet());
        inputs.claims = complete_claims();
        inputs.stakes.insert(
            100,
            vec![WalletRegionStake {
                week: 100,
                region_id: 1,
                wallet_staked: 1,
            }],
        );

        let result = score_wallet(&fixture.ctx(range, 110), inputs).expect("score");
        // 1 GLW steered, 3.0 points, boosted by 200/140.
        assert_eq!(result.totals.total_steering_glw_wei, GLW);
        assert_eq!(result.totals.steering_points, 4_285_714);
        assert!(result.has_steering_stake);
        assert_eq!(result.points_per_region.get(&1), Some(&4_285_714));
    }

    #[test]
    fn test_indexing_incomplete_degrades_to_warning() {
        let fixture = Fixture::new();
        let range = WeekRange::new(100, 100).expect("range");
        let mut inputs = WalletInputs::empty(wallet());
        inputs.rewards = vec![reward(90, 10 * GLW)];
        inputs.claims = Some(ClaimsSnapshot {
            indexing_complete: false,
            claims: vec![ClaimEvent {
                token: glow_ledger::reconciler::GLW_TOKEN_ADDRESS.to_string(),
                source: ClaimSource::MinerPool,
                amount_wei: 10 * GLW,
                timestamp: week_start_timestamp(100),
                nonce: None,
            }],
        });

        let result = score_wallet(&fixture.ctx(range, 110), inputs).expect("score");
        assert!(result.warnings.unclaimed.is_some());
        assert_eq!(result.glow_worth.unclaimed_glw_rewards_wei, 0);
    }

    #[test]
    fn test_excluded_wallet_keeps_shape() {
        let fixture = Fixture::new();
        let range = WeekRange::new(100, 102).expect("range");
        let mut inputs = WalletInputs::empty(wallet());
        inputs.claims = complete_claims();
        inputs.rewards = vec![reward(100, 10 * GLW)];
        inputs.excluded = true;

        let result = score_wallet(&fixture.ctx(range, 110), inputs).expect("score");
        assert_eq!(result.totals, ScoreTotals::default());
        assert_eq!(result.weekly.len(), 3);
        assert!(result.points_per_region.values().all(|p| *p == 0));
        assert_eq!(result.glow_worth.glow_worth_wei, 0);
    }

    #[test]
    fn test_last_week_points_week() {
        let range = WeekRange::new(100, 110).expect("range");
        assert_eq!(last_week_points_week(range, 120), 110);
        assert_eq!(last_week_points_week(range, 110), 109);
        assert_eq!(last_week_points_week(range, 105), 109);
    }

    #[test]
    fn test_distribute_by_weight_sums_to_total() {
        let weights: BTreeMap<RegionId, u128> = [(1, 1), (2, 1), (3, 1)].into_iter().collect();
        let parts = distribute_by_weight(100, &weights);
        assert_eq!(parts.values().sum::<u128>(), 100);
        assert_eq!(parts[&1], 34);

        let parts = distribute_by_weight(7, &BTreeMap::new());
        assert_eq!(parts.get(&UNASSIGNED_REGION), Some(&7));
        assert!(distribute_by_weight(0, &weights).is_empty());
    }

    #[test]
    fn test_region_points_sum_to_total() {
        let mut fixture = Fixture::new();
        fixture.region_rewards.insert(
            100,
            vec![
                RegionRewardSnapshot {
                    week: 100,
                    region_id: 1,
                    gctl_staked: 300,
                    glw_reward_wei: 3 * GLW,
                },
                RegionRewardSnapshot {
                    week: 100,
                    region_id: 2,
                    gctl_staked: 100,
                    glw_reward_wei: GLW,
                },
            ],
        );
        let range = WeekRange::new(100, 100).expect("range");
        let mut inputs = WalletInputs::empty(wallet());
        inputs.claims = complete_claims();
        inputs.rewards = vec![reward(100, 3 * GLW)];
        inputs.live_balance_wei = 777 * GLW;

        let result = score_wallet(&fixture.ctx(range, 110), inputs).expect("score");
        let region_sum: u128 = result.points_per_region.values().sum();
        assert_eq!(region_sum, result.totals.total_points);
        let composition = &result.composition;
        assert_eq!(
            composition.steering_points
                + composition.inflation_points
                + composition.vault_points
                + composition.worth_points,
            result.totals.total_points
        );
    }
}
