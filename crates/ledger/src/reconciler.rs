//! Reward & claim reconciler.
//!
//! Weekly rewards come from the partner ledger; claims come from the on-chain
//! indexer. Two claim kinds are reconciled differently:
//!
//! - **Protocol-deposit (PD)** claims from the rewards kernel carry a nonce
//!   that decodes to the week they pay (`first_v2_week + nonce`).
//! - **Inflation** claims from the miner pool carry no week. They are matched
//!   to the reward week whose inflation is closest in amount, and only when
//!   that week is within `epsilon_wei` and strictly closer than the runner-up.
//!
//! A week's inflation becomes claimable `inflation_lag_weeks` after it
//! occurred, PD `pd_lag_weeks` after. Claimable weeks without a claim are
//! *unclaimed*; PD still inside its lag window is *pending recovered*.

use crate::error::{LedgerError, Result};
use glow_primitives::{week_end_timestamp, week_start_timestamp, Week, FIRST_V2_WEEK};
use glow_types::{ClaimEvent, ClaimSource, ClaimsSnapshot, WalletRewardRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// GLW token contract on mainnet.
pub const GLW_TOKEN_ADDRESS: &str = "0xf4fbc617a5733eaaf9af08e1ab816b103388d8b6";

/// Reconciliation constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Lowercase GLW token address; claims for other tokens are ignored.
    #[serde(default = "default_glw_token")]
    pub glw_token: String,
    /// Maximum distance for an inflation amount match.
    #[serde(default = "default_epsilon_wei")]
    pub epsilon_wei: u128,
    /// Weeks before inflation becomes claimable.
    #[serde(default = "default_inflation_lag")]
    pub inflation_lag_weeks: Week,
    /// Weeks before protocol-deposit recovery becomes claimable.
    #[serde(default = "default_pd_lag")]
    pub pd_lag_weeks: Week,
    /// Week claim nonce 0 pays; claims before it are ignored.
    #[serde(default = "default_first_v2_week")]
    pub first_v2_week: Week,
}

fn default_glw_token() -> String {
    GLW_TOKEN_ADDRESS.to_string()
}

fn default_epsilon_wei() -> u128 {
    10_000_000
}

fn default_inflation_lag() -> Week {
    3
}

fn default_pd_lag() -> Week {
    4
}

fn default_first_v2_week() -> Week {
    FIRST_V2_WEEK
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            glw_token: default_glw_token(),
            epsilon_wei: default_epsilon_wei(),
            inflation_lag_weeks: default_inflation_lag(),
            pd_lag_weeks: default_pd_lag(),
            first_v2_week: default_first_v2_week(),
        }
    }
}

impl ReconcilerConfig {
    /// Longest claimability lag.
    pub fn max_lag(&self) -> Week {
        self.inflation_lag_weeks.max(self.pd_lag_weeks)
    }
}

/// Outcome of matching one inflation claim by amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimMatch {
    /// Claim pays this week's inflation.
    Matched(Week),
    /// No candidate within epsilon.
    NoMatch,
    /// Best candidate within epsilon but not strictly closer than the next.
    Ambiguous,
}

/// Matches `amount` against `(week, inflation)` candidates.
///
/// Zero-amount candidates are skipped.
pub fn match_claim_amount<I>(amount: u128, candidates: I, epsilon_wei: u128) -> ClaimMatch
where
    I: IntoIterator<Item = (Week, u128)>,
{
    let mut best: Option<(Week, u128)> = None;
    let mut second: Option<u128> = None;

    for (week, candidate) in candidates {
        if candidate == 0 {
            continue;
        }
        let distance = amount.abs_diff(candidate);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {
                if second.map_or(true, |s| distance < s) {
                    second = Some(distance);
                }
            }
            _ => {
                second = best.map(|(_, d)| d);
                best = Some((week, distance));
            }
        }
    }

    match best {
        None => ClaimMatch::NoMatch,
        Some((_, distance)) if distance > epsilon_wei => ClaimMatch::NoMatch,
        Some((week, distance)) => {
            if second.map_or(true, |s| distance < s) {
                ClaimMatch::Matched(week)
            } else {
                ClaimMatch::Ambiguous
            }
        }
    }
}

/// Rewards earned in one week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardWeek {
    /// Inflation reward.
    pub inflation_glw_wei: u128,
    /// Protocol-deposit recovery paid in GLW.
    pub protocol_deposit_glw_wei: u128,
}

/// A wallet's rewards keyed by week.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardTimeline {
    weeks: BTreeMap<Week, RewardWeek>,
}

impl RewardTimeline {
    /// Sums reward rows per week. Non-GLW protocol deposits count as zero.
    pub fn from_rows(rows: &[WalletRewardRow]) -> Self {
        let mut weeks: BTreeMap<Week, RewardWeek> = BTreeMap::new();
        for row in rows {
            let entry = weeks.entry(row.week).or_default();
            entry.inflation_glw_wei = entry.inflation_glw_wei.saturating_add(row.inflation_glw_wei);
            entry.protocol_deposit_glw_wei = entry
                .protocol_deposit_glw_wei
                .saturating_add(row.protocol_deposit_glw_wei());
        }
        Self { weeks }
    }

    /// Rewards for one week.
    pub fn week(&self, week: Week) -> RewardWeek {
        self.weeks.get(&week).copied().unwrap_or_default()
    }

    /// Weeks with rewards in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (Week, &RewardWeek)> {
        self.weeks.iter().map(|(week, reward)| (*week, reward))
    }

    /// Whether any week carries rewards.
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

/// Unclaimed and pending-recovered balances at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnclaimedBreakdown {
    /// Claimable but not claimed.
    pub unclaimed_wei: u128,
    /// Protocol-deposit recovery still inside its lag window.
    pub pending_recovered_wei: u128,
}

/// Claim timestamps per reward week, plus match statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimReconciliation {
    inflation_claimed_at: BTreeMap<Week, u64>,
    pd_claimed_at: BTreeMap<Week, u64>,
    /// Claims tied to a week.
    pub matched: usize,
    /// Inflation claims left unresolved because of a tie.
    pub ambiguous: usize,
    /// Claims that could not be tied to any week.
    pub unmatched: usize,
}

impl ClaimReconciliation {
    /// Ties the indexer's claims to reward weeks.
    ///
    /// Fails closed with [`LedgerError::IndexingIncomplete`] while the indexer
    /// is still catching up.
    pub fn reconcile(
        config: &ReconcilerConfig,
        timeline: &RewardTimeline,
        snapshot: &ClaimsSnapshot,
    ) -> Result<Self> {
        if !snapshot.indexing_complete {
            return Err(LedgerError::IndexingIncomplete);
        }

        let v2_start = week_start_timestamp(config.first_v2_week);
        let mut claims: Vec<&ClaimEvent> = snapshot
            .claims
            .iter()
            .filter(|claim| claim.token.eq_ignore_ascii_case(&config.glw_token))
            .filter(|claim| claim.timestamp >= v2_start)
            .collect();
        claims.sort_by_key(|claim| (claim.timestamp, claim.amount_wei));

        let mut out = Self::default();
        for claim in claims {
            match claim.source {
                ClaimSource::RewardsKernel => match claim.nonce {
                    Some(nonce) => {
                        let week = config
                            .first_v2_week
                            .saturating_add(nonce.min(u64::from(Week::MAX)) as Week);
                        out.pd_claimed_at.entry(week).or_insert(claim.timestamp);
                        out.matched += 1;
                    }
                    None => out.unmatched += 1,
                },
                ClaimSource::MinerPool => {
                    let candidates = timeline
                        .iter()
                        .filter(|(week, _)| !out.inflation_claimed_at.contains_key(week))
                        .filter(|(week, _)| week_start_timestamp(*week) <= claim.timestamp)
                        .map(|(week, reward)| (week, reward.inflation_glw_wei));
                    match match_claim_amount(claim.amount_wei, candidates, config.epsilon_wei) {
                        ClaimMatch::Matched(week) => {
                            out.inflation_claimed_at.insert(week, claim.timestamp);
                            out.matched += 1;
                        }
                        ClaimMatch::Ambiguous => out.ambiguous += 1,
                        ClaimMatch::NoMatch => out.unmatched += 1,
                    }
                }
                ClaimSource::Other => {}
            }
        }

        debug!(
            matched = out.matched,
            ambiguous = out.ambiguous,
            unmatched = out.unmatched,
            "claims reconciled"
        );
        Ok(out)
    }

    /// Week's inflation claimed strictly before `cutoff`.
    fn inflation_claimed_before(&self, week: Week, cutoff: u64) -> bool {
        self.inflation_claimed_at
            .get(&week)
            .is_some_and(|ts| *ts < cutoff)
    }

    /// Week's protocol-deposit recovery claimed strictly before `cutoff`.
    fn pd_claimed_before(&self, week: Week, cutoff: u64) -> bool {
        self.pd_claimed_at.get(&week).is_some_and(|ts| *ts < cutoff)
    }

    /// What was unclaimed and pending as of the end of week `as_of`.
    ///
    /// A reward week counts as unclaimed when its claim is missing or landed
    /// after `as_of` ended.
    pub fn as_of(
        &self,
        config: &ReconcilerConfig,
        timeline: &RewardTimeline,
        as_of: Week,
    ) -> UnclaimedBreakdown {
        let cutoff = week_end_timestamp(as_of);
        let mut out = UnclaimedBreakdown::default();

        for (week, reward) in timeline.iter() {
            if week > as_of {
                break;
            }
            if week.saturating_add(config.inflation_lag_weeks) <= as_of
                && !self.inflation_claimed_before(week, cutoff)
            {
                out.unclaimed_wei = out.unclaimed_wei.saturating_add(reward.inflation_glw_wei);
            }
            if !self.pd_claimed_before(week, cutoff) {
                if week.saturating_add(config.pd_lag_weeks) <= as_of {
                    out.unclaimed_wei = out
                        .unclaimed_wei
                        .saturating_add(reward.protocol_deposit_glw_wei);
                } else {
                    out.pending_recovered_wei = out
                        .pending_recovered_wei
                        .saturating_add(reward.protocol_deposit_glw_wei);
                }
            }
        }

        out
    }

    /// Current figures: weeks at or before `current_week - max_lag` that
    /// were never claimed are unclaimed; unclaimed PD after that threshold is
    /// pending.
    pub fn snapshot(
        &self,
        config: &ReconcilerConfig,
        timeline: &RewardTimeline,
        current_week: Week,
    ) -> UnclaimedBreakdown {
        let threshold = current_week.checked_sub(config.max_lag());
        let mut out = UnclaimedBreakdown::default();

        for (week, reward) in timeline.iter() {
            if week > current_week {
                break;
            }
            let claimable = threshold.is_some_and(|t| week <= t);
            let pd_claimed = self.pd_claimed_at.contains_key(&week);
            if claimable {
                if !self.inflation_claimed_at.contains_key(&week) {
                    out.unclaimed_wei = out.unclaimed_wei.saturating_add(reward.inflation_glw_wei);
                }
                if !pd_claimed {
                    out.unclaimed_wei = out
                        .unclaimed_wei
                        .saturating_add(reward.protocol_deposit_glw_wei);
                }
            } else if !pd_claimed {
                out.pending_recovered_wei = out
                    .pending_recovered_wei
                    .saturating_add(reward.protocol_deposit_glw_wei);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLW: u128 = 1_000_000_000_000_000_000;

    fn reward(week: Week, inflation: u128, pd: u128) -> WalletRewardRow {
        WalletRewardRow {
            week,
            farm_id: Some("farm".to_string()),
            region_id: Some(1),
            asset: Some("GLW".to_string()),
            inflation_glw_wei: inflation,
            protocol_deposit_received_wei: pd,
        }
    }

    fn claim(source: ClaimSource, amount: u128, timestamp: u64, nonce: Option<u64>) -> ClaimEvent {
        ClaimEvent {
            token: GLW_TOKEN_ADDRESS.to_string(),
            source,
            amount_wei: amount,
            timestamp,
            nonce,
        }
    }

    #[test]
    fn test_match_within_one_wei() {
        let candidates = vec![(100, 5 * GLW), (101, 7 * GLW)];
        assert_eq!(
            match_claim_amount(5 * GLW + 1, candidates.clone(), 10_000_000),
            ClaimMatch::Matched(100)
        );
        assert_eq!(
            match_claim_amount(7 * GLW - 1, candidates, 10_000_000),
            ClaimMatch::Matched(101)
        );
    }

    #[test]
    fn test_equidistant_is_ambiguous() {
        let candidates = vec![(100, 1_000), (101, 1_010)];
        assert_eq!(
            match_claim_amount(1_005, candidates, 10_000_000),
            ClaimMatch::Ambiguous
        );
    }

    #[test]
    fn test_outside_epsilon_is_no_match() {
        let candidates = vec![(100, 5 * GLW)];
        assert_eq!(
            match_claim_amount(5 * GLW + 10_000_001, candidates, 10_000_000),
            ClaimMatch::NoMatch
        );
        assert_eq!(
            match_claim_amount(5, Vec::<(Week, u128)>::new(), 10_000_000),
            ClaimMatch::NoMatch
        );
    }

    #[test]
    fn test_incomplete_indexing_fails_closed() {
        let timeline = RewardTimeline::from_rows(&[reward(100, GLW, 0)]);
        let snapshot = ClaimsSnapshot {
            indexing_complete: false,
            claims: Vec::new(),
        };
        assert_eq!(
            ClaimReconciliation::reconcile(&ReconcilerConfig::default(), &timeline, &snapshot),
            Err(LedgerError::IndexingIncomplete)
        );
    }

    #[test]
    fn test_historical_unclaimed_respects_claim_time() {
        let config = ReconcilerConfig::default();
        let timeline = RewardTimeline::from_rows(&[reward(100, 5 * GLW, 0)]);
        // Claimed during week 106.
        let snapshot = ClaimsSnapshot {
            indexing_complete: true,
            claims: vec![claim(
                ClaimSource::MinerPool,
                5 * GLW,
                week_start_timestamp(106) + 10,
                None,
            )],
        };
        let recon = ClaimReconciliation::reconcile(&config, &timeline, &snapshot).expect("reconcile");
        assert_eq!(recon.matched, 1);

        // Not yet claimable.
        assert_eq!(recon.as_of(&config, &timeline, 102).unclaimed_wei, 0);
        // Claimable and not yet claimed.
        assert_eq!(recon.as_of(&config, &timeline, 103).unclaimed_wei, 5 * GLW);
        assert_eq!(recon.as_of(&config, &timeline, 105).unclaimed_wei, 5 * GLW);
        // Claimed inside week 106.
        assert_eq!(recon.as_of(&config, &timeline, 106).unclaimed_wei, 0);
    }

    #[test]
    fn test_pd_claims_decode_nonce_and_pending_window() {
        let config = ReconcilerConfig::default();
        let timeline = RewardTimeline::from_rows(&[reward(98, 0, 2 * GLW), reward(99, 0, 3 * GLW)]);
        let snapshot = ClaimsSnapshot {
            indexing_complete: true,
            claims: vec![claim(
                ClaimSource::RewardsKernel,
                2 * GLW,
                week_start_timestamp(103),
                Some(1),
            )],
        };
        let recon = ClaimReconciliation::reconcile(&config, &timeline, &snapshot).expect("reconcile");

        let at_100 = recon.as_of(&config, &timeline, 100);
        assert_eq!(at_100.unclaimed_wei, 0);
        assert_eq!(at_100.pending_recovered_wei, 5 * GLW);

        // Week 98 claimed in 103; week 99 claimable at 103 but unclaimed.
        let at_103 = recon.as_of(&config, &timeline, 103);
        assert_eq!(at_103.unclaimed_wei, 3 * GLW);
        assert_eq!(at_103.pending_recovered_wei, 0);
    }

    #[test]
    fn test_claims_for_other_tokens_and_pre_v2_are_ignored() {
        let config = ReconcilerConfig::default();
        let timeline = RewardTimeline::from_rows(&[reward(100, 5 * GLW, 0)]);
        let mut foreign = claim(ClaimSource::MinerPool, 5 * GLW, week_start_timestamp(105), None);
        foreign.token = "0x0000000000000000000000000000000000000001".to_string();
        let early = claim(ClaimSource::MinerPool, 5 * GLW, week_start_timestamp(90), None);
        let snapshot = ClaimsSnapshot {
            indexing_complete: true,
            claims: vec![foreign, early],
        };
        let recon = ClaimReconciliation::reconcile(&config, &timeline, &snapshot).expect("reconcile");
        assert_eq!(recon.matched + recon.ambiguous + recon.unmatched, 0);
        assert_eq!(recon.as_of(&config, &timeline, 110).unclaimed_wei, 5 * GLW);
    }

    #[test]
    fn test_matched_week_is_not_reused() {
        let config = ReconcilerConfig::default();
        let timeline = RewardTimeline::from_rows(&[reward(100, 5 * GLW, 0), reward(101, 5 * GLW + 100, 0)]);
        let snapshot = ClaimsSnapshot {
            indexing_complete: true,
            claims: vec![
                claim(ClaimSource::MinerPool, 5 * GLW, week_start_timestamp(104), None),
                claim(ClaimSource::MinerPool, 5 * GLW, week_start_timestamp(105), None),
            ],
        };
        let recon = ClaimReconciliation::reconcile(&config, &timeline, &snapshot).expect("reconcile");
        assert_eq!(recon.matched, 2);
        assert_eq!(recon.as_of(&config, &timeline, 110).unclaimed_wei, 0);
    }

    #[test]
    fn test_snapshot_threshold_uses_max_lag() {
        let config = ReconcilerConfig::default();
        let timeline = RewardTimeline::from_rows(&[
            reward(100, GLW, 0),
            reward(101, GLW, 0),
            reward(102, 0, 4 * GLW),
        ]);
        let snapshot = ClaimsSnapshot {
            indexing_complete: true,
            claims: Vec::new(),
        };
        let recon = ClaimReconciliation::reconcile(&config, &timeline, &snapshot).expect("reconcile");
        let now = recon.snapshot(&config, &timeline, 104);
        assert_eq!(now.unclaimed_wei, GLW);
        assert_eq!(now.pending_recovered_wei, 4 * GLW);
    }
}
