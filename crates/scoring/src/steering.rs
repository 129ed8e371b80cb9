//! Steering rewards and the foundation boost.
//!
//! A wallet that stakes GCTL in a region "steers" a pro-rata share of that
//! region's weekly GLW emission. The foundation also stakes; its share is
//! redistributed to everyone else through a per-region boost of
//! `total / (total - foundation)`.
//!
//! [`SteeringLoader`] assembles the weekly snapshots: the local snapshot
//! cache first, the Control API for weeks the cache misses (backfilling the
//! cache), and the wallet's current stake for the uncached weeks when
//! history is unavailable.

use crate::multiplier::STEERING_POINTS_PER_GLW_SCALED6;
use crate::sources::{SourceError, SteeringSnapshotCache, SteeringSource};
use futures::stream::{self, StreamExt};
use glow_primitives::{glw_wei_to_points_scaled6, mul_div};
use glow_types::{
    normalize_wallets, RegionId, RegionRewardSnapshot, WalletAddress, WalletRegionStake, Week,
    WeekRange,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Foundation GCTL stake keyed by `(week, region)`.
pub type FoundationStakes = BTreeMap<(Week, RegionId), u128>;

/// Region reward snapshots keyed by week.
pub type RegionRewardsByWeek = BTreeMap<Week, Vec<RegionRewardSnapshot>>;

/// Wallet stake rows keyed by week.
pub type WalletStakesByWeek = BTreeMap<Week, Vec<WalletRegionStake>>;

/// `region_reward * wallet_stake / region_total`; 0 when either stake is 0.
pub fn steered_share(region_reward_wei: u128, wallet_stake: u128, region_total_stake: u128) -> u128 {
    if wallet_stake == 0 || region_total_stake == 0 {
        return 0;
    }
    mul_div(region_reward_wei, wallet_stake, region_total_stake)
}

/// GLW steered per region for one week.
pub fn steering_for_week(
    wallet_stakes: &[WalletRegionStake],
    region_rewards: &[RegionRewardSnapshot],
) -> BTreeMap<RegionId, u128> {
    let mut out = BTreeMap::new();
    for stake in wallet_stakes.iter().filter(|s| s.wallet_staked > 0) {
        let Some(region) = region_rewards
            .iter()
            .find(|r| r.region_id == stake.region_id)
        else {
            continue;
        };
        let steered = steered_share(region.glw_reward_wei, stake.wallet_staked, region.gctl_staked);
        if steered > 0 {
            let entry = out.entry(stake.region_id).or_insert(0u128);
            *entry = entry.saturating_add(steered);
        }
    }
    out
}

/// `(total, total - foundation)` when a boost applies, `None` for 1.0x.
///
/// A foundation stake that covers the whole region leaves no one to boost.
fn boost_ratio(total_stake: u128, foundation_stake: u128) -> Option<(u128, u128)> {
    if total_stake == 0 || foundation_stake == 0 || foundation_stake >= total_stake {
        return None;
    }
    Some((total_stake, total_stake - foundation_stake))
}

/// Applies the foundation boost `total / (total - foundation)` to `points`
/// with a single multiply-then-divide. Clamps to 1.0x when the foundation
/// holds the whole region.
pub fn apply_foundation_boost(points_scaled6: u128, total_stake: u128, foundation_stake: u128) -> u128 {
    match boost_ratio(total_stake, foundation_stake) {
        Some((numerator, denominator)) => mul_div(points_scaled6, numerator, denominator),
        None => points_scaled6,
    }
}

/// `(week, region)` pairs where the foundation stake covers the whole
/// region, so the boost clamps to 1.0x.
pub fn saturated_regions(
    region_rewards: &RegionRewardsByWeek,
    foundation: &FoundationStakes,
) -> Vec<(Week, RegionId)> {
    region_rewards
        .iter()
        .flat_map(|(week, rows)| rows.iter().map(move |row| (*week, row)))
        .filter(|(week, row)| {
            let foundation_stake = foundation.get(&(*week, row.region_id)).copied().unwrap_or(0);
            row.gctl_staked > 0 && foundation_stake > 0 && foundation_stake >= row.gctl_staked
        })
        .map(|(week, row)| (week, row.region_id))
        .collect()
}

/// Lowercases, validates and dedupes configured foundation wallets.
pub fn normalize_foundation_wallets<I, S>(wallets: I) -> Vec<WalletAddress>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    normalize_wallets(wallets)
}

/// Sums foundation stake per `(week, region)`.
pub fn foundation_stakes<'a, I>(stakes: I) -> FoundationStakes
where
    I: IntoIterator<Item = &'a WalletStakesByWeek>,
{
    let mut out = FoundationStakes::new();
    for by_week in stakes {
        for (week, rows) in by_week {
            for row in rows {
                let entry = out.entry((*week, row.region_id)).or_insert(0);
                *entry = entry.saturating_add(row.wallet_staked);
            }
        }
    }
    out
}

/// Steering in one region for one week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionSteering {
    /// GLW steered.
    pub glw_wei: u128,
    /// Boosted points before the weekly multiplier.
    pub points_scaled6: u128,
}

/// Steering outcome for one wallet and week.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SteeringWeek {
    /// GLW steered across regions.
    pub steered_glw_wei: u128,
    /// Boosted points before the weekly multiplier.
    pub points_scaled6: u128,
    /// Per-region detail.
    pub by_region: BTreeMap<RegionId, RegionSteering>,
}

/// Steered GLW and boosted points for `week`.
pub fn steering_week(
    week: Week,
    wallet_stakes: &[WalletRegionStake],
    region_rewards: &[RegionRewardSnapshot],
    foundation: &FoundationStakes,
) -> SteeringWeek {
    let mut out = SteeringWeek::default();
    for (region_id, glw_wei) in steering_for_week(wallet_stakes, region_rewards) {
        let total = region_rewards
            .iter()
            .find(|r| r.region_id == region_id)
            .map(|r| r.gctl_staked)
            .unwrap_or(0);
        let foundation_stake = foundation.get(&(week, region_id)).copied().unwrap_or(0);
        let base = glw_wei_to_points_scaled6(glw_wei, STEERING_POINTS_PER_GLW_SCALED6);
        let points_scaled6 = apply_foundation_boost(base, total, foundation_stake);

        out.steered_glw_wei = out.steered_glw_wei.saturating_add(glw_wei);
        out.points_scaled6 = out.points_scaled6.saturating_add(points_scaled6);
        out.by_region.insert(
            region_id,
            RegionSteering {
                glw_wei,
                points_scaled6,
            },
        );
    }
    out
}

/// Wallet stake history plus whether it came from the current-stake fallback.
#[derive(Debug, Clone, Default)]
pub struct LoadedStakes {
    /// Rows per week.
    pub by_week: WalletStakesByWeek,
    /// Set when history could not be loaded; describes the fallback used.
    pub warning: Option<String>,
}

/// Read-through loader for steering snapshots.
#[derive(Clone)]
pub struct SteeringLoader {
    source: Arc<dyn SteeringSource>,
    cache: Option<Arc<dyn SteeringSnapshotCache>>,
    region_concurrency: usize,
}

impl SteeringLoader {
    pub fn new(
        source: Arc<dyn SteeringSource>,
        cache: Option<Arc<dyn SteeringSnapshotCache>>,
        region_concurrency: usize,
    ) -> Self {
        Self {
            source,
            cache,
            region_concurrency: region_concurrency.max(1),
        }
    }

    /// Region rewards for every week in `range`.
    ///
    /// Missing weeks are fetched one epoch at a time and written back to the
    /// cache. If nothing could be loaded the current snapshot stands in for
    /// every week and the returned warning says so.
    pub async fn region_rewards(
        &self,
        range: WeekRange,
    ) -> Result<(RegionRewardsByWeek, Option<String>), SourceError> {
        let mut by_week = match &self.cache {
            Some(cache) => cache.region_rewards(range).await.unwrap_or_else(|e| {
                warn!(error = %e, "steering cache read failed, fetching region rewards upstream");
                RegionRewardsByWeek::new()
            }),
            None => RegionRewardsByWeek::new(),
        };

        let missing: Vec<Week> = range.weeks().filter(|w| !by_week.contains_key(w)).collect();
        if missing.is_empty() {
            return Ok((by_week, None));
        }

        let fetched: Vec<(Week, Result<Vec<RegionRewardSnapshot>, SourceError>)> =
            stream::iter(missing.iter().copied())
                .map(|week| {
                    let source = self.source.clone();
                    async move { (week, source.region_rewards_at(week).await) }
                })
                .buffer_unordered(self.region_concurrency)
                .collect()
                .await;

        let mut failed = 0usize;
        for (week, result) in fetched {
            match result {
                Ok(rows) => {
                    if let Some(cache) = &self.cache {
                        if let Err(e) = cache.store_region_rewards(week, &rows).await {
                            warn!(week, error = %e, "failed to backfill region rewards");
                        }
                    }
                    by_week.insert(week, rows);
                }
                Err(e) => {
                    warn!(week, error = %e, "region rewards fetch failed");
                    failed += 1;
                }
            }
        }
        debug!(
            weeks = missing.len(),
            failed, "region rewards backfilled from upstream"
        );

        if failed == 0 {
            return Ok((by_week, None));
        }
        if !by_week.is_empty() {
            return Ok((
                by_week,
                Some(format!("region rewards unavailable for {failed} weeks")),
            ));
        }

        let current = self.source.current_region_rewards().await?;
        let by_week = range
            .weeks()
            .map(|week| {
                let rows = current
                    .iter()
                    .map(|r| RegionRewardSnapshot { week, ..r.clone() })
                    .collect();
                (week, rows)
            })
            .collect();
        Ok((
            by_week,
            Some("historical region rewards unavailable, using current snapshot".to_string()),
        ))
    }

    /// A wallet's stake for every week in `range`.
    ///
    /// Cached weeks are always kept. Uncached weeks come from the stake
    /// history, or from the current stake when history is unavailable. Never
    /// fails: weeks that cannot be filled at all steer nothing and the warning
    /// names them.
    pub async fn wallet_stakes(&self, wallet: &WalletAddress, range: WeekRange) -> LoadedStakes {
        let mut by_week = match &self.cache {
            Some(cache) => cache.wallet_stakes(wallet, range).await.unwrap_or_else(|e| {
                warn!(wallet = %wallet, error = %e, "steering cache read failed");
                WalletStakesByWeek::new()
            }),
            None => WalletStakesByWeek::new(),
        };

        let missing: Vec<Week> = range.weeks().filter(|w| !by_week.contains_key(w)).collect();
        let (Some(first), Some(last)) = (missing.first(), missing.last()) else {
            return LoadedStakes {
                by_week,
                warning: None,
            };
        };
        let fetch_range = WeekRange {
            start_week: *first,
            end_week: *last,
        };

        match self.source.wallet_stake_by_epoch(wallet, fetch_range).await {
            Ok(rows) => {
                let mut fetched: WalletStakesByWeek =
                    missing.iter().map(|week| (*week, Vec::new())).collect();
                for row in rows.into_iter().filter(|r| fetch_range.contains(r.week)) {
                    fetched.entry(row.week).or_default().push(row);
                }
                for (week, rows) in fetched {
                    if !by_week.contains_key(&week) {
                        if let Some(cache) = &self.cache {
                            if let Err(e) = cache.store_wallet_stakes(wallet, week, &rows).await {
                                warn!(wallet = %wallet, week, error = %e, "failed to backfill wallet stakes");
                            }
                        }
                        by_week.insert(week, rows);
                    }
                }
                LoadedStakes {
                    by_week,
                    warning: None,
                }
            }
            Err(e) => {
                warn!(
                    wallet = %wallet,
                    error = %e,
                    weeks = missing.len(),
                    "stake history unavailable, using current stake for uncached weeks"
                );
                self.current_stake_fallback(wallet, by_week, &missing).await
            }
        }
    }

    /// Fills `missing` weeks from the current stake; cached weeks stay as they are.
    async fn current_stake_fallback(
        &self,
        wallet: &WalletAddress,
        mut by_week: WalletStakesByWeek,
        missing: &[Week],
    ) -> LoadedStakes {
        let weeks = describe_weeks(missing);
        match self.source.current_wallet_stake(wallet).await {
            Ok(current) => {
                for &week in missing {
                    let rows = current
                        .iter()
                        .map(|r| WalletRegionStake { week, ..r.clone() })
                        .collect();
                    by_week.insert(week, rows);
                }
                LoadedStakes {
                    by_week,
                    warning: Some(format!(
                        "stake history unavailable for {weeks}, using current stake"
                    )),
                }
            }
            Err(e) => {
                warn!(wallet = %wallet, error = %e, "current stake unavailable, uncached weeks zeroed");
                LoadedStakes {
                    by_week,
                    warning: Some(format!("steering unavailable for {weeks}: {e}")),
                }
            }
        }
    }
}

/// "week 110" or "weeks 100-110 (3 weeks)" for warnings.
fn describe_weeks(weeks: &[Week]) -> String {
    match (weeks.first(), weeks.last()) {
        (Some(first), Some(last)) if first == last => format!("week {first}"),
        (Some(first), Some(last)) => format!("weeks {first}-{last} ({} weeks)", weeks.len()),
        _ => "no weeks".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLW: u128 = 1_000_000_000_000_000_000;

    fn region(week: Week, region_id: RegionId, staked: u128, reward: u128) -> RegionRewardSnapshot {
        RegionRewardSnapshot {
            week,
            region_id,
            gctl_staked: staked,
            glw_reward_wei: reward,
        }
    }

    fn stake(week: Week, region_id: RegionId, staked: u128) -> WalletRegionStake {
        WalletRegionStake {
            week,
            region_id,
            wallet_staked: staked,
        }
    }

    #[test]
    fn test_boost_ratio_clamps() {
        assert_eq!(boost_ratio(200, 100), Some((200, 100)));
        assert_eq!(boost_ratio(200, 0), None);
        assert_eq!(boost_ratio(0, 0), None);
        assert_eq!(boost_ratio(100, 100), None);
        assert_eq!(boost_ratio(100, 150), None);
    }

    #[test]
    fn test_apply_boost_single_rounding() {
        assert_eq!(apply_foundation_boost(3_000_000, 200, 60), 4_285_714);
        assert_eq!(apply_foundation_boost(1_000_000, 200, 100), 2_000_000);
        assert_eq!(apply_foundation_boost(3_000_000, 200, 0), 3_000_000);
        assert_eq!(apply_foundation_boost(3_000_000, 200, 200), 3_000_000);
        assert_eq!(apply_foundation_boost(3_000_000, 100, 150), 3_000_000);
    }

    #[test]
    fn test_saturated_regions_listed_once_per_week() {
        let mut rewards = RegionRewardsByWeek::new();
        rewards.insert(100, vec![region(100, 1, 100, GLW), region(100, 2, 100, GLW)]);
        rewards.insert(101, vec![region(101, 1, 100, GLW)]);
        let mut foundation = FoundationStakes::new();
        foundation.insert((100, 1), 100);
        foundation.insert((100, 2), 40);
        foundation.insert((101, 1), 150);

        assert_eq!(saturated_regions(&rewards, &foundation), vec![(100, 1), (101, 1)]);
    }

    #[test]
    fn test_describe_weeks() {
        assert_eq!(describe_weeks(&[110]), "week 110");
        assert_eq!(describe_weeks(&[100, 101, 110]), "weeks 100-110 (3 weeks)");
    }

    #[test]
    fn test_steered_share() {
        assert_eq!(steered_share(100 * GLW, 25, 100), 25 * GLW);
        assert_eq!(steered_share(100 * GLW, 0, 100), 0);
        assert_eq!(steered_share(100 * GLW, 10, 0), 0);
    }

    #[test]
    fn test_steering_week_applies_boost_per_region() {
        let rewards = vec![region(100, 1, 200, 100 * GLW), region(100, 2, 100, 50 * GLW)];
        let stakes = vec![stake(100, 1, 20), stake(100, 2, 10), stake(100, 3, 5)];
        let mut foundation = FoundationStakes::new();
        foundation.insert((100, 1), 100);

        let week = steering_week(100, &stakes, &rewards, &foundation);
        // Region 1: 10 GLW steered, 30 points, boosted 2x.
        assert_eq!(week.by_region[&1].glw_wei, 10 * GLW);
        assert_eq!(week.by_region[&1].points_scaled6, 60_000_000);
        // Region 2: 5 GLW steered, 15 points, no foundation.
        assert_eq!(week.by_region[&2].points_scaled6, 15_000_000);
        assert!(!week.by_region.contains_key(&3));
        assert_eq!(week.steered_glw_wei, 15 * GLW);
        assert_eq!(week.points_scaled6, 75_000_000);
    }

    #[test]
    fn test_foundation_stakes_sum_per_week_region() {
        let a: WalletStakesByWeek = [(100, vec![stake(100, 1, 10)])].into_iter().collect();
        let b: WalletStakesByWeek =
            [(100, vec![stake(100, 1, 5), stake(100, 2, 7)])].into_iter().collect();
        let stakes = foundation_stakes([&a, &b]);
        assert_eq!(stakes[&(100, 1)], 15);
        assert_eq!(stakes[&(100, 2)], 7);
    }

    #[test]
    fn test_normalize_foundation_wallets() {
        let wallets = normalize_foundation_wallets([
            "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
        ]);
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].as_str(), "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    }
}
