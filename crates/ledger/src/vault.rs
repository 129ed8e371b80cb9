//! Vault ownership ledger.
//!
//! A farm's GLW principal is recovered over time through protocol-deposit
//! distributions. Wallets own fractions of the *remaining* principal through
//! deposit split segments. This module answers, for any week:
//!
//! - `remaining_principal(farm, W) = max(0, principal - cumulative_distributed(W))`
//! - `delegated_active(wallet, W) = sum(remaining(farm, W) * split(farm, W) / 1e6)`
//! - `gross_share(wallet, W) = sum(principal(farm) * split(farm, W) / 1e6)`
//!
//! Distribution data past `finalized_week` is not trusted; remaining principal
//! is frozen at its finalized value for later weeks.

use crate::cursor::{SegmentCursor, TimelineCursor, TimelinePoint};
use crate::error::{LedgerError, Result};
use glow_primitives::{clamp_to_zero, mul_div, SPLIT_SCALE};
use glow_types::{
    DepositSplitSegment, FarmDistributionRow, FarmId, FarmPrincipal, RegionId, Week, WeekRange,
};
use std::collections::BTreeMap;
use tracing::debug;

/// One farm's principal and distribution timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmVault {
    farm_id: FarmId,
    region_id: Option<RegionId>,
    principal_glw_wei: u128,
    timeline: Vec<TimelinePoint>,
}

impl FarmVault {
    /// Builds the vault from weekly distribution rows.
    ///
    /// Rows for other farms and non-GLW rows are ignored; rows sharing a
    /// week are merged before prefix-summing.
    pub fn from_distributions(principal: &FarmPrincipal, rows: &[FarmDistributionRow]) -> Self {
        let mut by_week: BTreeMap<Week, u128> = BTreeMap::new();
        for row in rows {
            if row.farm_id != principal.farm_id || !row.is_glw() {
                continue;
            }
            let entry = by_week.entry(row.week).or_insert(0);
            *entry = entry.saturating_add(row.distributed_wei);
        }

        let mut cumulative = 0u128;
        let timeline = by_week
            .into_iter()
            .map(|(week, amount)| {
                cumulative = cumulative.saturating_add(amount);
                TimelinePoint {
                    week,
                    cumulative_wei: cumulative,
                }
            })
            .collect();

        Self {
            farm_id: principal.farm_id.clone(),
            region_id: principal.region_id,
            principal_glw_wei: principal.principal_glw_wei,
            timeline,
        }
    }

    /// Farm identifier.
    pub fn farm_id(&self) -> &str {
        &self.farm_id
    }

    /// Farm region, if known.
    pub fn region_id(&self) -> Option<RegionId> {
        self.region_id
    }

    /// Total principal.
    pub fn principal_glw_wei(&self) -> u128 {
        self.principal_glw_wei
    }

    /// Ascending `(week, cumulative)` points.
    pub fn timeline(&self) -> &[TimelinePoint] {
        &self.timeline
    }

    /// Fresh cursor for one ascending scan of this farm's timeline.
    pub fn cursor(&self) -> TimelineCursor<'_> {
        TimelineCursor::new(&self.timeline)
    }

    /// Cumulative distributed at `week` (binary search; for one-off queries).
    pub fn cumulative_distributed_at(&self, week: Week) -> u128 {
        let idx = self.timeline.partition_point(|point| point.week <= week);
        if idx == 0 {
            0
        } else {
            self.timeline[idx - 1].cumulative_wei
        }
    }

    /// Principal not yet distributed at `week`, clamped at 0.
    pub fn remaining_principal_at(&self, week: Week) -> u128 {
        self.principal_glw_wei
            .saturating_sub(self.cumulative_distributed_at(week))
    }
}

/// A wallet's split segments grouped per farm and sorted by start week.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletPosition {
    segments: BTreeMap<FarmId, Vec<DepositSplitSegment>>,
}

impl WalletPosition {
    /// Groups and validates segments. Overlapping or inverted segments are rejected.
    pub fn new(segments: impl IntoIterator<Item = DepositSplitSegment>) -> Result<Self> {
        let mut grouped: BTreeMap<FarmId, Vec<DepositSplitSegment>> = BTreeMap::new();
        for segment in segments {
            if segment.start_week > segment.end_week {
                return Err(LedgerError::InvalidSegment {
                    farm_id: segment.farm_id,
                    start: segment.start_week,
                    end: segment.end_week,
                });
            }
            grouped
                .entry(segment.farm_id.clone())
                .or_default()
                .push(segment);
        }

        for (farm_id, list) in grouped.iter_mut() {
            list.sort_by_key(|segment| (segment.start_week, segment.end_week));
            for pair in list.windows(2) {
                if pair[1].start_week <= pair[0].end_week {
                    return Err(LedgerError::OverlappingSegments {
                        farm_id: farm_id.clone(),
                        week: pair[1].start_week,
                    });
                }
            }
        }

        Ok(Self { segments: grouped })
    }

    /// Farms the wallet ever held a split in.
    pub fn farm_ids(&self) -> impl Iterator<Item = &FarmId> {
        self.segments.keys()
    }

    /// Segments for one farm.
    pub fn segments_for(&self, farm_id: &str) -> &[DepositSplitSegment] {
        self.segments
            .get(farm_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the wallet holds no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Per-farm share of a wallet for one week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmWeekShare {
    /// Farm.
    pub farm_id: FarmId,
    /// Farm region, if known.
    pub region_id: Option<RegionId>,
    /// Active split (scaled6).
    pub split_scaled6: u128,
    /// `principal * split`.
    pub gross_share_wei: u128,
    /// `remaining * split`, with the finality freeze applied.
    pub delegated_active_wei: u128,
}

/// A wallet's vault position for one week.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultWeek {
    /// Week.
    pub week: Week,
    /// Sum of gross shares.
    pub gross_share_wei: u128,
    /// Sum of delegated-active amounts.
    pub delegated_active_wei: u128,
    /// Farms with a non-zero split this week.
    pub farms: Vec<FarmWeekShare>,
}

/// All farm vaults known to the engine plus the finalized week.
#[derive(Debug, Clone, Default)]
pub struct VaultLedger {
    farms: BTreeMap<FarmId, FarmVault>,
    finalized_week: Week,
}

impl VaultLedger {
    /// Empty ledger.
    pub fn new(finalized_week: Week) -> Self {
        Self {
            farms: BTreeMap::new(),
            finalized_week,
        }
    }

    /// Builds vaults for every principal from the shared distribution rows.
    pub fn from_parts(
        principals: &[FarmPrincipal],
        distributions: &[FarmDistributionRow],
        finalized_week: Week,
    ) -> Self {
        let mut ledger = Self::new(finalized_week);
        for principal in principals {
            ledger.insert(FarmVault::from_distributions(principal, distributions));
        }
        debug!(
            farms = ledger.farms.len(),
            finalized_week, "vault ledger built"
        );
        ledger
    }

    /// Adds or replaces a farm vault.
    pub fn insert(&mut self, vault: FarmVault) {
        self.farms.insert(vault.farm_id.clone(), vault);
    }

    /// Looks up a farm.
    pub fn farm(&self, farm_id: &str) -> Option<&FarmVault> {
        self.farms.get(farm_id)
    }

    /// Region of a farm, if the farm is known and tagged.
    pub fn farm_region(&self, farm_id: &str) -> Option<RegionId> {
        self.farms.get(farm_id).and_then(FarmVault::region_id)
    }

    /// Last week whose distribution data is settled.
    pub fn finalized_week(&self) -> Week {
        self.finalized_week
    }

    fn effective_week(&self, week: Week) -> Week {
        week.min(self.finalized_week)
    }

    /// Remaining principal with the finality freeze. Unknown farms have none.
    pub fn remaining_principal(&self, farm_id: &str, week: Week) -> u128 {
        self.farms
            .get(farm_id)
            .map(|farm| farm.remaining_principal_at(self.effective_week(week)))
            .unwrap_or(0)
    }

    /// Delegated-active GLW at a single week.
    pub fn delegated_active_at(&self, position: &WalletPosition, week: Week) -> Result<u128> {
        Ok(self.scan(position).week(week)?.delegated_active_wei)
    }

    /// Gross share of principal at a single week.
    pub fn gross_share_at(&self, position: &WalletPosition, week: Week) -> Result<u128> {
        Ok(self.scan(position).week(week)?.gross_share_wei)
    }

    /// Starts an ascending week-by-week scan with fresh cursors.
    pub fn scan<'a>(&'a self, position: &'a WalletPosition) -> VaultScan<'a> {
        let farms = position
            .segments
            .iter()
            .filter_map(|(farm_id, segments)| {
                self.farms.get(farm_id).map(|vault| FarmScan {
                    vault,
                    timeline: vault.cursor(),
                    segments: SegmentCursor::new(segments),
                })
            })
            .collect();
        VaultScan {
            finalized_week: self.finalized_week,
            farms,
        }
    }

    /// The wallet's share of principal distributed across `range`.
    ///
    /// Each week's distribution is attributed at that week's split.
    pub fn principal_released(&self, position: &WalletPosition, range: WeekRange) -> Result<u128> {
        let mut released = 0u128;
        for (farm_id, segments) in &position.segments {
            let Some(vault) = self.farms.get(farm_id) else {
                continue;
            };
            let mut timeline = vault.cursor();
            let mut split_cursor = SegmentCursor::new(segments);

            let mut previous = match range.start_week.checked_sub(1) {
                Some(week) => timeline.cumulative_at(self.effective_week(week))?,
                None => 0,
            };
            for week in range.weeks() {
                let cumulative = timeline.cumulative_at(self.effective_week(week))?;
                let split = split_cursor.split_at(week)?;
                let distributed = cumulative.saturating_sub(previous);
                released = released.saturating_add(mul_div(distributed, split, SPLIT_SCALE));
                previous = cumulative;
            }
        }
        Ok(released)
    }
}

struct FarmScan<'a> {
    vault: &'a FarmVault,
    timeline: TimelineCursor<'a>,
    segments: SegmentCursor<'a>,
}

/// Ascending scan over a wallet's farms. Owns one timeline cursor and one
/// segment cursor per farm.
pub struct VaultScan<'a> {
    finalized_week: Week,
    farms: Vec<FarmScan<'a>>,
}

impl<'a> VaultScan<'a> {
    /// Position at `week`. Weeks must be requested in non-decreasing order.
    pub fn week(&mut self, week: Week) -> Result<VaultWeek> {
        let effective = week.min(self.finalized_week);
        let mut out = VaultWeek {
            week,
            ..VaultWeek::default()
        };

        for farm in &mut self.farms {
            let cumulative = farm.timeline.cumulative_at(effective)?;
            let split = farm.segments.split_at(week)?;
            if split == 0 {
                continue;
            }

            let principal = farm.vault.principal_glw_wei;
            let remaining = principal.saturating_sub(cumulative);
            let gross_share_wei = mul_div(principal, split, SPLIT_SCALE);
            let delegated_active_wei = mul_div(remaining, split, SPLIT_SCALE);

            out.gross_share_wei = out.gross_share_wei.saturating_add(gross_share_wei);
            out.delegated_active_wei = out
                .delegated_active_wei
                .saturating_add(delegated_active_wei);
            out.farms.push(FarmWeekShare {
                farm_id: farm.vault.farm_id.clone(),
                region_id: farm.vault.region_id,
                split_scaled6: split,
                gross_share_wei,
                delegated_active_wei,
            });
        }

        Ok(out)
    }
}

/// Freshly purchased GLW the partner ledger has not reflected yet:
/// `max(0, cumulative_net_purchases - gross_share)`.
pub fn pending_delegated(cumulative_net_purchases_wei: i128, gross_share_wei: u128) -> u128 {
    let gross = i128::try_from(gross_share_wei).unwrap_or(i128::MAX);
    clamp_to_zero(cumulative_net_purchases_wei.saturating_sub(gross))
}
