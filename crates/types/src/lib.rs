//! Core types for the Glow impact engine
//!
//! Shared definitions used by the ledger, scoring, storage and leaderboard
//! crates. Amounts are carried as `u128` and serialized as decimal strings
//! (see [`serde_helpers`]) so no precision is lost at the JSON boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod inputs;
pub mod leaderboard;
pub mod score;
pub mod serde_helpers;

pub use glow_primitives::{Week, WeekRange};
pub use inputs::{
    BalanceSnapshot, ClaimEvent, ClaimSource, ClaimsSnapshot, DepositSplitSegment,
    FarmDistributionRow, FarmPrincipal, PurchaseKind, PurchaseRecord, RefundRecord,
    RegionRewardSnapshot, WalletRegionStake, WalletRewardRow,
};
pub use leaderboard::{
    DelegatorRow, DelegatorsSnapshot, ImpactLeaderboardSnapshot, LeaderboardFlags, LeaderboardRow,
    LeaderboardSortKey, RegionTotalsRow,
};
pub use score::{
    CurrentWeekProjection, GlowImpactScoreResult, GlowWorth, ScoreComposition, ScoreTotals,
    ScoreWarnings, WeeklyImpactRow,
};

/// Farm identifier as issued by the Control API.
pub type FarmId = String;

/// Steering region identifier.
pub type RegionId = u32;

/// Region used for amounts that cannot be attributed to a real region.
pub const UNASSIGNED_REGION: RegionId = 0;

/// Type-level errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    /// Not a `0x`-prefixed 20-byte hex address.
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    /// Unknown leaderboard sort key.
    #[error("invalid sort key: {0}")]
    InvalidSortKey(String),
}

/// Lowercased EVM wallet address.
///
/// Ordering is lexicographic over the lowercase hex form, which is the
/// leaderboard tie-break order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parses and normalizes an address.
    pub fn parse(input: &str) -> Result<Self, TypesError> {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();
        let hex = lower
            .strip_prefix("0x")
            .ok_or_else(|| TypesError::InvalidAddress(input.to_string()))?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypesError::InvalidAddress(input.to_string()));
        }
        Ok(Self(lower))
    }

    /// The zero address, used as the key of the leaderboard system row.
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(40)))
    }

    /// Lowercase hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

/// Lowercases, validates and dedupes a wallet list, dropping malformed entries.
/// Order of first appearance is kept.
pub fn normalize_wallets<I, S>(wallets: I) -> Vec<WalletAddress>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for wallet in wallets {
        if let Ok(address) = WalletAddress::parse(wallet.as_ref()) {
            if seen.insert(address.clone()) {
                out.push(address);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_address_normalizes_case() {
        let address =
            WalletAddress::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").expect("valid");
        assert_eq!(address.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_wallet_address_rejects_malformed() {
        assert!(WalletAddress::parse("abcdef").is_err());
        assert!(WalletAddress::parse("0x1234").is_err());
        assert!(WalletAddress::parse("0xZZcdef0123456789abcdef0123456789abcdef01").is_err());
    }

    #[test]
    fn test_wallet_address_serde_roundtrip() {
        let json = "\"0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\"";
        let address: WalletAddress = serde_json::from_str(json).expect("deserialize");
        assert_eq!(address.as_str(), "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert!(serde_json::from_str::<WalletAddress>("\"nope\"").is_err());
    }

    #[test]
    fn test_normalize_wallets_dedupes() {
        let wallets = normalize_wallets([
            "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "garbage",
            "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
        ]);
        assert_eq!(wallets.len(), 2);
        assert!(wallets[0] < wallets[1]);
    }
}
