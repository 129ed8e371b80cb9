//! Delegators leaderboard rows.

use glow_primitives::{mul_div, POINTS_SCALE};
use glow_scoring::DelegationSummary;
use glow_types::{DelegatorRow, WeekRange};

/// Ranks wallets with an active delegation by delegated GLW.
///
/// `share_percent` is scaled6 percent of the total actively delegated by
/// the ranked wallets. Ties break by ascending wallet address.
pub fn delegator_rows(summaries: &[DelegationSummary], range: WeekRange) -> Vec<DelegatorRow> {
    let active: Vec<&DelegationSummary> = summaries
        .iter()
        .filter(|s| s.actively_delegated_wei > 0)
        .collect();
    let total: u128 = active
        .iter()
        .fold(0u128, |acc, s| acc.saturating_add(s.actively_delegated_wei));

    let mut rows: Vec<DelegatorRow> = active
        .into_iter()
        .map(|s| DelegatorRow {
            rank: 0,
            wallet_address: s.wallet_address.clone(),
            week_range: range,
            actively_delegated_glw_wei: s.actively_delegated_wei,
            glw_per_week_wei: s.glw_per_week_wei,
            net_rewards_wei: s.net_rewards_wei(),
            share_percent: if total == 0 {
                0
            } else {
                mul_div(s.actively_delegated_wei, 100 * POINTS_SCALE, total)
            },
        })
        .collect();

    rows.sort_by(|a, b| {
        b.actively_delegated_glw_wei
            .cmp(&a.actively_delegated_glw_wei)
            .then_with(|| a.wallet_address.cmp(&b.wallet_address))
    });
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index as u32 + 1;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_types::{ScoreWarnings, WalletAddress};

    fn summary(wallet: char, delegated: u128, gross: u128, released: u128) -> DelegationSummary {
        DelegationSummary {
            wallet_address: WalletAddress::parse(&format!("0x{}", wallet.to_string().repeat(40)))
                .expect("wallet"),
            week_range: WeekRange::new(97, 110).expect("range"),
            actively_delegated_wei: delegated,
            glw_per_week_wei: 1,
            gross_rewards_wei: gross,
            principal_released_wei: released,
            warnings: ScoreWarnings::default(),
        }
    }

    #[test]
    fn test_share_and_rank() {
        let range = WeekRange::new(97, 110).expect("range");
        let rows = delegator_rows(
            &[
                summary('a', 100, 5, 10),
                summary('b', 300, 40, 10),
                summary('c', 0, 50, 0),
            ],
            range,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].share_percent, 75_000_000);
        assert_eq!(rows[0].net_rewards_wei, 30);
        assert_eq!(rows[1].share_percent, 25_000_000);
        assert_eq!(rows[1].net_rewards_wei, -5);
    }

    #[test]
    fn test_equal_delegation_ordered_by_address() {
        let range = WeekRange::new(97, 110).expect("range");
        let rows = delegator_rows(&[summary('d', 50, 0, 0), summary('a', 50, 0, 0)], range);
        assert!(rows[0].wallet_address < rows[1].wallet_address);
        assert_eq!(rows[0].share_percent, 50_000_000);
    }
}
