//! Leaderboard read path.
//!
//! Pages are served from an in-process TTL cache, then from the stored
//! snapshot when the query asks for the default range, and only then
//! computed on demand.

use crate::error::Result;
use crate::materializer::{ImpactBuild, Materializer};
use crate::sort::rank_rows;
use glow_storage::TtlCache;
use glow_types::{
    DelegatorRow, DelegatorsSnapshot, ImpactLeaderboardSnapshot, LeaderboardRow,
    LeaderboardSortKey, RegionTotalsRow, WalletAddress, WeekRange, WeeklyImpactRow,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Impact leaderboard request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeaderboardQuery {
    /// Defaults to the materializer's default range.
    pub range: Option<WeekRange>,
    /// Defaults to the configured page size.
    pub limit: Option<usize>,
    pub sort: LeaderboardSortKey,
    pub include_weekly: bool,
}

/// One page of the impact leaderboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPage {
    pub week_range: WeekRange,
    /// Ranked wallets before the limit was applied.
    pub total_wallets: usize,
    pub rows: Vec<LeaderboardRow>,
    pub region_totals: RegionTotalsRow,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub weekly: BTreeMap<WalletAddress, Vec<WeeklyImpactRow>>,
    pub computed_at: u64,
    /// Served from the stored snapshot rather than computed for this query.
    pub from_snapshot: bool,
}

impl LeaderboardPage {
    /// Re-ranks a stored snapshot by `sort` and keeps the first `limit` rows.
    pub fn from_snapshot(
        snapshot: ImpactLeaderboardSnapshot,
        sort: LeaderboardSortKey,
        limit: usize,
    ) -> Self {
        let mut rows = snapshot.rows;
        rank_rows(&mut rows, sort);
        let total_wallets = rows.len();
        rows.truncate(limit);
        Self {
            week_range: snapshot.week_range,
            total_wallets,
            rows,
            region_totals: snapshot.region_totals,
            weekly: BTreeMap::new(),
            computed_at: snapshot.computed_at,
            from_snapshot: true,
        }
    }

    fn from_build(build: ImpactBuild, limit: usize) -> Self {
        let ImpactBuild {
            snapshot, weekly, ..
        } = build;
        let total_wallets = snapshot.rows.len();
        let mut rows = snapshot.rows;
        rows.truncate(limit);
        let kept: HashSet<&WalletAddress> = rows.iter().map(|r| &r.wallet_address).collect();
        let weekly = weekly
            .into_iter()
            .filter(|(wallet, _)| kept.contains(wallet))
            .collect();
        Self {
            week_range: snapshot.week_range,
            total_wallets,
            rows,
            region_totals: snapshot.region_totals,
            weekly,
            computed_at: snapshot.computed_at,
            from_snapshot: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PageKey {
    range: WeekRange,
    limit: usize,
    sort: LeaderboardSortKey,
    include_weekly: bool,
}

pub struct LeaderboardService {
    materializer: Arc<Materializer>,
    pages: TtlCache<PageKey, LeaderboardPage>,
    delegators: TtlCache<(WeekRange, usize), DelegatorsSnapshot>,
}

impl LeaderboardService {
    pub fn new(materializer: Arc<Materializer>) -> Self {
        let ttl = materializer.config().cache_ttl;
        let clock = materializer.engine().clock();
        Self {
            materializer,
            pages: TtlCache::new(ttl, clock.clone()),
            delegators: TtlCache::new(ttl, clock),
        }
    }

    pub fn materializer(&self) -> &Arc<Materializer> {
        &self.materializer
    }

    /// Impact leaderboard page for `query`.
    pub async fn impact(&self, query: LeaderboardQuery) -> Result<LeaderboardPage> {
        let default_range = self.materializer.default_range();
        let key = PageKey {
            range: query.range.unwrap_or(default_range),
            limit: query
                .limit
                .unwrap_or(self.materializer.config().default_limit),
            sort: query.sort,
            include_weekly: query.include_weekly,
        };
        if let Some(page) = self.pages.get(&key).await {
            debug!(start_week = key.range.start_week, end_week = key.range.end_week, "leaderboard cache hit");
            return Ok(page);
        }

        if key.range == default_range && !key.include_weekly {
            match self.materializer.store().impact_leaderboard().await {
                Ok(Some(snapshot)) if snapshot.week_range == key.range => {
                    let page = LeaderboardPage::from_snapshot(snapshot, key.sort, key.limit);
                    self.pages.insert(key, page.clone()).await;
                    return Ok(page);
                }
                Ok(_) => debug!("no stored snapshot for the default range"),
                Err(e) => warn!(error = %e, "stored leaderboard unreadable, computing"),
            }
        }

        let build = self
            .materializer
            .build_impact(key.range, key.sort, key.include_weekly)
            .await?;
        let page = LeaderboardPage::from_build(build, key.limit);
        self.pages.insert(key, page.clone()).await;
        Ok(page)
    }

    /// Delegators leaderboard over `range` (default range when `None`).
    pub async fn delegators(
        &self,
        range: Option<WeekRange>,
        limit: Option<usize>,
    ) -> Result<DelegatorsSnapshot> {
        let default_range = self.materializer.default_range();
        let range = range.unwrap_or(default_range);
        let limit = limit.unwrap_or(self.materializer.config().default_limit);
        let key = (range, limit);
        if let Some(snapshot) = self.delegators.get(&key).await {
            return Ok(snapshot);
        }

        let stored = if range == default_range {
            match self.materializer.store().delegators_leaderboard().await {
                Ok(snapshot) => snapshot.filter(|s| s.week_range == range),
                Err(e) => {
                    warn!(error = %e, "stored delegators unreadable, computing");
                    None
                }
            }
        } else {
            None
        };
        let mut snapshot = match stored {
            Some(snapshot) => snapshot,
            None => self.materializer.build_delegators(range).await?,
        };
        truncate_delegators(&mut snapshot.rows, limit);
        self.delegators.insert(key, snapshot.clone()).await;
        Ok(snapshot)
    }

    /// Refreshes both stored boards and drops every cached page.
    pub async fn refresh(&self) -> Result<(ImpactLeaderboardSnapshot, DelegatorsSnapshot)> {
        let impact = self.materializer.refresh_impact().await?;
        let delegators = self.materializer.refresh_delegators().await?;
        self.invalidate().await;
        Ok((impact, delegators))
    }

    pub async fn invalidate(&self) {
        self.pages.clear().await;
        self.delegators.clear().await;
    }
}

fn truncate_delegators(rows: &mut Vec<DelegatorRow>, limit: usize) {
    rows.sort_by_key(|r| r.rank);
    rows.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_types::{LeaderboardFlags, ScoreComposition};

    fn row(wallet: char, total: u128, last_week: u128) -> LeaderboardRow {
        LeaderboardRow {
            rank: 0,
            wallet_address: WalletAddress::parse(&format!("0x{}", wallet.to_string().repeat(40)))
                .expect("wallet"),
            week_range: WeekRange::new(97, 100).expect("range"),
            total_points: total,
            glow_worth_wei: 0,
            last_week_points: last_week,
            composition: ScoreComposition::default(),
            flags: LeaderboardFlags::default(),
            points_per_region: BTreeMap::new(),
        }
    }

    #[test]
    fn test_snapshot_page_reranks_and_limits() {
        let snapshot = ImpactLeaderboardSnapshot {
            week_range: WeekRange::new(97, 100).expect("range"),
            rows: vec![row('a', 30, 1), row('b', 20, 9), row('c', 10, 5)],
            region_totals: RegionTotalsRow::default(),
            computed_at: 42,
        };
        let page = LeaderboardPage::from_snapshot(snapshot, LeaderboardSortKey::LastWeekPoints, 2);
        assert!(page.from_snapshot);
        assert_eq!(page.total_wallets, 3);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].last_week_points, 9);
        assert_eq!(page.rows[0].rank, 1);
        assert_eq!(page.rows[1].last_week_points, 5);
    }

    #[test]
    fn test_built_page_keeps_weekly_for_listed_rows_only() {
        let rows = vec![row('a', 30, 0), row('b', 20, 0)];
        let mut weekly = BTreeMap::new();
        for r in &rows {
            weekly.insert(r.wallet_address.clone(), Vec::new());
        }
        let build = ImpactBuild {
            snapshot: ImpactLeaderboardSnapshot {
                week_range: WeekRange::new(97, 100).expect("range"),
                rows,
                region_totals: RegionTotalsRow::default(),
                computed_at: 1,
            },
            weekly,
            skipped: 0,
        };
        let page = LeaderboardPage::from_build(build, 1);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.weekly.len(), 1);
        assert!(page.weekly.contains_key(&page.rows[0].wallet_address));
        assert!(!page.from_snapshot);
    }
}
