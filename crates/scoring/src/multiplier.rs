//! Point rates, base multipliers and the impact streak.

use glow_primitives::MULTIPLIER_SCALE;

/// +1.0 point per GLW of inflation.
pub const INFLATION_POINTS_PER_GLW_SCALED6: u128 = 1_000_000;
/// +3.0 points per GLW steered.
pub const STEERING_POINTS_PER_GLW_SCALED6: u128 = 3_000_000;
/// +0.005 points per delegated GLW per week.
pub const VAULT_BONUS_POINTS_PER_GLW_SCALED6: u128 = 5_000;
/// +0.001 points per GLW of GlowWorth per week.
pub const GLOW_WORTH_POINTS_PER_GLW_SCALED6: u128 = 1_000;

/// 1.0x.
pub const BASE_STANDARD_MULTIPLIER_SCALED6: u128 = MULTIPLIER_SCALE;
/// 3.0x in a week with a mining-center purchase.
pub const BASE_CASH_MINER_MULTIPLIER_SCALED6: u128 = 3_000_000;
/// +0.25x per streak week.
pub const STREAK_BONUS_PER_WEEK_SCALED6: u128 = 250_000;
/// Streak weeks that earn a bonus.
pub const STREAK_BONUS_CAP_WEEKS: u32 = 4;

/// Streak bonus for `streak_weeks`: 0 for `n <= 0`, then `+0.25x` per week up to `1.0x`.
pub fn streak_bonus_multiplier_scaled6(streak_weeks: i64) -> u128 {
    if streak_weeks <= 0 {
        return 0;
    }
    let effective = streak_weeks.min(i64::from(STREAK_BONUS_CAP_WEEKS)) as u128;
    effective * STREAK_BONUS_PER_WEEK_SCALED6
}

/// Base multiplier for a week.
pub fn base_multiplier_scaled6(has_cash_miner_purchase: bool) -> u128 {
    if has_cash_miner_purchase {
        BASE_CASH_MINER_MULTIPLIER_SCALED6
    } else {
        BASE_STANDARD_MULTIPLIER_SCALED6
    }
}

/// Multiplier breakdown for one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekMultiplier {
    /// Whether the week had a mining-center purchase.
    pub has_cash_miner_bonus: bool,
    /// Streak length after this week.
    pub impact_streak_weeks: u32,
    /// 1.0x or 3.0x.
    pub base_scaled6: u128,
    /// Streak bonus.
    pub streak_bonus_scaled6: u128,
    /// `base + streak bonus`.
    pub total_scaled6: u128,
}

/// Tracks the impact streak over an ascending week scan.
///
/// A week extends the streak when the effective gross vault share rose over
/// the previous week or the wallet bought a mining-center fraction; any
/// other week resets it. Seed the tracker with the week before the scan so
/// that a position held before the window is not read as an increase.
#[derive(Debug, Clone, Default)]
pub struct StreakTracker {
    previous_gross_wei: Option<u128>,
    weeks: u32,
}

impl StreakTracker {
    /// Tracker with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the gross share of the week before the first observed week.
    pub fn seed(&mut self, gross_share_wei: u128) {
        self.previous_gross_wei = Some(gross_share_wei);
    }

    /// Feeds the next week and returns its multiplier.
    pub fn observe(&mut self, gross_share_wei: u128, has_cash_miner_purchase: bool) -> WeekMultiplier {
        let increased = match self.previous_gross_wei {
            Some(previous) => gross_share_wei > previous,
            None => gross_share_wei > 0,
        };
        self.weeks = if increased || has_cash_miner_purchase {
            self.weeks.saturating_add(1)
        } else {
            0
        };
        self.previous_gross_wei = Some(gross_share_wei);

        let base_scaled6 = base_multiplier_scaled6(has_cash_miner_purchase);
        let streak_bonus_scaled6 = streak_bonus_multiplier_scaled6(i64::from(self.weeks));
        WeekMultiplier {
            has_cash_miner_bonus: has_cash_miner_purchase,
            impact_streak_weeks: self.weeks,
            base_scaled6,
            streak_bonus_scaled6,
            total_scaled6: base_scaled6 + streak_bonus_scaled6,
        }
    }

    /// Current streak length.
    pub fn weeks(&self) -> u32 {
        self.weeks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streak_bonus_bounds() {
        assert_eq!(streak_bonus_multiplier_scaled6(-3), 0);
        assert_eq!(streak_bonus_multiplier_scaled6(0), 0);
        assert_eq!(streak_bonus_multiplier_scaled6(1), 250_000);
        assert_eq!(streak_bonus_multiplier_scaled6(4), 1_000_000);
        assert_eq!(streak_bonus_multiplier_scaled6(40), 1_000_000);
    }

    #[test]
    fn test_streak_bonus_non_decreasing() {
        let mut previous = 0;
        for n in -5..20 {
            let bonus = streak_bonus_multiplier_scaled6(n);
            assert!(bonus >= previous);
            previous = bonus;
        }
    }

    #[test]
    fn test_streak_increments_and_resets() {
        let mut tracker = StreakTracker::new();
        assert_eq!(tracker.observe(100, false).impact_streak_weeks, 1);
        assert_eq!(tracker.observe(200, false).impact_streak_weeks, 2);
        assert_eq!(tracker.observe(200, false).impact_streak_weeks, 0);
        assert_eq!(tracker.observe(150, true).impact_streak_weeks, 1);
        assert_eq!(tracker.weeks(), 1);
    }

    #[test]
    fn test_cash_miner_week_multiplier() {
        let mut tracker = StreakTracker::new();
        tracker.observe(10, false);
        tracker.observe(20, false);
        let week = tracker.observe(20, true);
        assert_eq!(week.base_scaled6, 3_000_000);
        assert_eq!(week.streak_bonus_scaled6, 750_000);
        assert_eq!(week.total_scaled6, 3_750_000);
    }

    #[test]
    fn test_seeded_position_is_not_an_increase() {
        // Held since before the window, then grown in the last four weeks.
        let mut unseeded = StreakTracker::new();
        let mut seeded = StreakTracker::new();
        seeded.seed(100);
        for gross in [100, 200, 300, 400, 500] {
            unseeded.observe(gross, false);
            seeded.observe(gross, false);
        }
        assert_eq!(unseeded.weeks(), 5);
        assert_eq!(seeded.weeks(), 4);
    }

    #[test]
    fn test_seeded_cash_miner_week_still_counts() {
        let mut tracker = StreakTracker::new();
        tracker.seed(100);
        assert_eq!(tracker.observe(100, false).impact_streak_weeks, 0);
        assert_eq!(tracker.observe(100, true).impact_streak_weeks, 1);
    }
}
