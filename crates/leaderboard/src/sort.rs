//! Ranking order.

use glow_types::{LeaderboardRow, LeaderboardSortKey};

/// Value a row is ranked by under `key`.
pub fn sort_value(row: &LeaderboardRow, key: LeaderboardSortKey) -> u128 {
    match key {
        LeaderboardSortKey::TotalPoints => row.total_points,
        LeaderboardSortKey::GlowWorth => row.glow_worth_wei,
        LeaderboardSortKey::LastWeekPoints => row.last_week_points,
        LeaderboardSortKey::SteeringPoints => row.composition.steering_points,
        LeaderboardSortKey::InflationPoints => row.composition.inflation_points,
        LeaderboardSortKey::VaultPoints => row.composition.vault_points,
        LeaderboardSortKey::WorthPoints => row.composition.worth_points,
    }
}

/// Sorts descending by `key`, ties by ascending wallet address, and
/// renumbers ranks from 1.
pub fn rank_rows(rows: &mut [LeaderboardRow], key: LeaderboardSortKey) {
    rows.sort_by(|a, b| {
        sort_value(b, key)
            .cmp(&sort_value(a, key))
            .then_with(|| a.wallet_address.cmp(&b.wallet_address))
    });
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_types::{LeaderboardFlags, ScoreComposition, WalletAddress, WeekRange};
    use std::collections::BTreeMap;

    fn row(wallet: char, total: u128, worth: u128) -> LeaderboardRow {
        LeaderboardRow {
            rank: 0,
            wallet_address: WalletAddress::parse(&format!("0x{}", wallet.to_string().repeat(40)))
                .expect("wallet"),
            week_range: WeekRange::new(97, 100).expect("range"),
            total_points: total,
            glow_worth_wei: worth,
            last_week_points: 0,
            composition: ScoreComposition::default(),
            flags: LeaderboardFlags::default(),
            points_per_region: BTreeMap::new(),
        }
    }

    #[test]
    fn test_ties_break_by_address() {
        let mut rows = vec![row('c', 5, 0), row('a', 5, 0), row('b', 9, 0)];
        rank_rows(&mut rows, LeaderboardSortKey::TotalPoints);
        let order: Vec<(char, u32)> = rows
            .iter()
            .map(|r| (r.wallet_address.as_str().chars().nth(2).unwrap_or('?'), r.rank))
            .collect();
        assert_eq!(order, vec![('b', 1), ('a', 2), ('c', 3)]);
    }

    #[test]
    fn test_alternate_sort_key() {
        let mut rows = vec![row('a', 9, 1), row('b', 1, 7)];
        rank_rows(&mut rows, LeaderboardSortKey::GlowWorth);
        assert_eq!(rows[0].wallet_address.as_str().chars().nth(2), Some('b'));
        assert_eq!(rows[1].rank, 2);
    }
}
