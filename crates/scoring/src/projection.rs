//! Projection of the in-progress week.

use crate::compute::{
    seeded_streak, DelegatedWeek, ScoreContext, WalletInputs, WalletLedgers, STREAK_LOOKBACK_WEEKS,
};
use crate::error::Result;
use crate::multiplier::{
    GLOW_WORTH_POINTS_PER_GLW_SCALED6, INFLATION_POINTS_PER_GLW_SCALED6,
    VAULT_BONUS_POINTS_PER_GLW_SCALED6,
};
use crate::steering::steering_week;
use glow_primitives::{apply_multiplier_scaled6, glw_wei_to_points_scaled6};
use glow_types::{CurrentWeekProjection, RegionRewardSnapshot, WalletRegionStake, WeekRange};

/// Projects points for `ctx.current_week` from the current steering snapshot.
///
/// The streak is replayed from four weeks before the range start through the
/// current week. Inflation for the in-progress week is used when the ledger
/// already reports it. Rollover and GlowWorth continuous points are both
/// scaled by the week's total multiplier, as for a completed week.
pub fn project_current_week(
    ctx: &ScoreContext<'_>,
    inputs: &WalletInputs,
    current_stakes: &[WalletRegionStake],
    current_region_rewards: &[RegionRewardSnapshot],
) -> Result<CurrentWeekProjection> {
    let mut warnings = inputs.warnings.clone();
    let ledgers = WalletLedgers::build(ctx.reconciler, inputs, &mut warnings);
    let week = ctx.current_week;
    let replay = WeekRange::new(ctx.range.start_week.min(week), week)?;

    let scanned = replay.with_lookback(STREAK_LOOKBACK_WEEKS);
    let mut scan = ctx.vaults.scan(&ledgers.position);
    let mut streak = seeded_streak(&mut scan, &inputs.purchases, scanned.start_week)?;
    let mut has_miner_multiplier = false;
    let mut last = None;
    for w in scanned.weeks() {
        let delegated = DelegatedWeek::at(&mut scan, &inputs.purchases, w)?;
        let has_cash_miner = inputs.purchases.has_mining_center_purchase(w);
        let multiplier = streak.observe(delegated.effective_gross_wei(), has_cash_miner);
        if w >= ctx.range.start_week {
            has_miner_multiplier |= has_cash_miner;
        }
        last = Some((delegated, multiplier));
    }
    let Some((delegated, multiplier)) = last else {
        return Err(glow_primitives::RangeError::Inverted {
            start: replay.start_week,
            end: replay.end_week,
        }
        .into());
    };

    let steering = steering_week(week, current_stakes, current_region_rewards, ctx.foundation);
    let inflation_glw_wei = ledgers.timeline.week(week).inflation_glw_wei;
    let delegated_glw_wei = delegated.delegated_active_wei();
    let unclaimed = ledgers.unclaimed_now(ctx.reconciler, week);
    let glow_worth_wei = inputs
        .live_balance_wei
        .saturating_add(delegated_glw_wei)
        .saturating_add(unclaimed.unclaimed_wei)
        .saturating_add(unclaimed.pending_recovered_wei);

    let rollover_pre = glw_wei_to_points_scaled6(inflation_glw_wei, INFLATION_POINTS_PER_GLW_SCALED6)
        .saturating_add(steering.points_scaled6)
        .saturating_add(glw_wei_to_points_scaled6(
            delegated_glw_wei,
            VAULT_BONUS_POINTS_PER_GLW_SCALED6,
        ));
    let continuous = apply_multiplier_scaled6(
        glw_wei_to_points_scaled6(glow_worth_wei, GLOW_WORTH_POINTS_PER_GLW_SCALED6),
        multiplier.total_scaled6,
    );
    let total_projected_points =
        apply_multiplier_scaled6(rollover_pre, multiplier.total_scaled6).saturating_add(continuous);

    Ok(CurrentWeekProjection {
        week,
        has_miner_multiplier,
        has_steering_stake: steering.steered_glw_wei > 0,
        impact_streak_weeks: multiplier.impact_streak_weeks,
        base_multiplier: multiplier.base_scaled6,
        streak_bonus_multiplier: multiplier.streak_bonus_scaled6,
        total_multiplier: multiplier.total_scaled6,
        steering_glw_wei: steering.steered_glw_wei,
        inflation_glw_wei,
        delegated_glw_wei,
        glow_worth_wei,
        total_projected_points,
    })
}
