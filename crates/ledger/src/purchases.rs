//! Locally recorded purchases and refunds, bucketed by protocol week.

use glow_primitives::week_of_timestamp;
use glow_types::{PurchaseKind, PurchaseRecord, RefundRecord, Week};
use std::collections::{BTreeMap, BTreeSet};

/// Net launchpad delegation per week and the weeks with a mining-center purchase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseLedger {
    net_by_week: BTreeMap<Week, i128>,
    mining_center_weeks: BTreeSet<Week>,
}

fn signed(amount: u128) -> i128 {
    i128::try_from(amount).unwrap_or(i128::MAX)
}

impl PurchaseLedger {
    /// Buckets purchases and refunds by the week of their timestamp.
    pub fn from_records(purchases: &[PurchaseRecord], refunds: &[RefundRecord]) -> Self {
        let mut ledger = Self::default();
        for purchase in purchases {
            let week = week_of_timestamp(purchase.timestamp);
            match purchase.kind {
                PurchaseKind::Launchpad => {
                    let entry = ledger.net_by_week.entry(week).or_insert(0);
                    *entry = entry.saturating_add(signed(purchase.amount_glw_wei));
                }
                PurchaseKind::MiningCenter => {
                    ledger.mining_center_weeks.insert(week);
                }
            }
        }
        for refund in refunds {
            if refund.kind != PurchaseKind::Launchpad {
                continue;
            }
            let week = week_of_timestamp(refund.timestamp);
            let entry = ledger.net_by_week.entry(week).or_insert(0);
            *entry = entry.saturating_sub(signed(refund.amount_glw_wei));
        }
        ledger
    }

    /// Net launchpad delegation in `week`.
    pub fn net_in_week(&self, week: Week) -> i128 {
        self.net_by_week.get(&week).copied().unwrap_or(0)
    }

    /// Net launchpad delegation through `week`, inclusive.
    pub fn cumulative_net_through(&self, week: Week) -> i128 {
        self.net_by_week
            .range(..=week)
            .fold(0i128, |acc, (_, delta)| acc.saturating_add(*delta))
    }

    /// Whether the wallet bought a mining-center fraction in `week`.
    pub fn has_mining_center_purchase(&self, week: Week) -> bool {
        self.mining_center_weeks.contains(&week)
    }

    /// Whether the wallet ever bought a mining-center fraction up to `week`.
    pub fn any_mining_center_through(&self, week: Week) -> bool {
        self.mining_center_weeks.range(..=week).next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_primitives::week_start_timestamp;
    use glow_types::WalletAddress;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x3333333333333333333333333333333333333333").expect("wallet")
    }

    #[test]
    fn test_net_delegation_and_mining_weeks() {
        let purchases = vec![
            PurchaseRecord {
                wallet: wallet(),
                kind: PurchaseKind::Launchpad,
                amount_glw_wei: 100,
                timestamp: week_start_timestamp(100) + 5,
            },
            PurchaseRecord {
                wallet: wallet(),
                kind: PurchaseKind::MiningCenter,
                amount_glw_wei: 50,
                timestamp: week_start_timestamp(101),
            },
        ];
        let refunds = vec![
            RefundRecord {
                wallet: wallet(),
                kind: PurchaseKind::Launchpad,
                amount_glw_wei: 30,
                timestamp: week_start_timestamp(102),
            },
            RefundRecord {
                wallet: wallet(),
                kind: PurchaseKind::MiningCenter,
                amount_glw_wei: 50,
                timestamp: week_start_timestamp(102),
            },
        ];

        let ledger = PurchaseLedger::from_records(&purchases, &refunds);
        assert_eq!(ledger.cumulative_net_through(99), 0);
        assert_eq!(ledger.cumulative_net_through(101), 100);
        assert_eq!(ledger.cumulative_net_through(102), 70);
        assert_eq!(ledger.net_in_week(102), -30);
        assert!(ledger.has_mining_center_purchase(101));
        assert!(!ledger.has_mining_center_purchase(102));
        assert!(ledger.any_mining_center_through(105));
        assert!(!ledger.any_mining_center_through(100));
    }
}
