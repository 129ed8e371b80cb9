//! Vault ownership ledger and reward/claim reconciler.
//!
//! ## Architecture
//!
//! - [`vault`]: per-farm principal and prefix-summed distribution timelines,
//!   wallet split segments, delegated-active and gross-share queries with the
//!   finality freeze and pending-purchase smoothing.
//! - [`cursor`]: forward-only cursors over timelines and segments. A cursor
//!   belongs to exactly one ascending scan; asking it for an earlier week is
//!   an error.
//! - [`reconciler`]: merges weekly rewards with indexed claim transfers into
//!   unclaimed and pending-recovered balances.
//! - [`purchases`]: net launchpad delegation and mining-center purchase weeks.

#![warn(missing_docs)]

pub mod cursor;
pub mod error;
pub mod purchases;
pub mod reconciler;
pub mod vault;

pub use cursor::{SegmentCursor, TimelineCursor, TimelinePoint};
pub use error::{LedgerError, Result};
pub use purchases::PurchaseLedger;
pub use reconciler::{
    match_claim_amount, ClaimMatch, ClaimReconciliation, ReconcilerConfig, RewardTimeline,
    RewardWeek, UnclaimedBreakdown,
};
pub use vault::{
    pending_delegated, FarmVault, FarmWeekShare, VaultLedger, VaultScan, VaultWeek,
    WalletPosition,
};
