//! Glow impact score engine.
//!
//! Turns reward ledgers, vault positions, claims, steering stake and liquid
//! balances into weekly points and a GlowWorth figure per wallet.
//!
//! ## Architecture
//!
//! - [`sources`]: async traits for every upstream collaborator
//! - [`steering`]: steered GLW, foundation boost, read-through snapshot loader
//! - [`multiplier`]: point rates, base multiplier and impact streak
//! - [`compute`]: pure per-wallet computation over pre-fetched inputs
//! - [`projection`]: the in-progress week
//! - [`delegation`]: vault figures for the delegators leaderboard
//! - [`engine`]: batch orchestration with bounded concurrency and timeouts
//!
//! Failures of individual upstream fetches never fail a wallet: the engine
//! substitutes zeros or a fallback snapshot and records a warning on the
//! result.

pub mod compute;
pub mod delegation;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod multiplier;
pub mod projection;
pub mod sources;
pub mod steering;

pub use compute::{
    distribute_by_weight, last_week_points_week, score_wallet, ScoreContext, WalletInputs,
    STREAK_LOOKBACK_WEEKS,
};
pub use delegation::{summarize_delegation, DelegationSummary};
pub use engine::{
    RangeSnapshot, ScoreOptions, ScoringConfig, ScoringEngine, ScoringSources, WalletDelegation,
    WalletScore,
};
pub use error::{Result, ScoringError};
pub use metrics::ScoringMetrics;
pub use multiplier::{streak_bonus_multiplier_scaled6, StreakTracker, WeekMultiplier};
pub use projection::project_current_week;
pub use sources::{
    BalanceSnapshotStore, Batched, ClaimsSource, LiquidBalanceSource, PurchaseSource,
    RewardLedgerSource, SourceError, SteeringSnapshotCache, SteeringSource, WalletUniverseSource,
};
pub use steering::{
    apply_foundation_boost, normalize_foundation_wallets, saturated_regions, steered_share,
    steering_for_week, FoundationStakes, LoadedStakes, RegionRewardsByWeek, SteeringLoader,
    SteeringWeek,
};
