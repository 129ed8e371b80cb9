//! # Glow Simulation Crate
//!
//! Deterministic, in-process harness for end-to-end tests of the impact
//! engine. Every upstream (reward ledger, claims indexer, RPC, Control API
//! steering) is an in-memory mock, storage is the memory backend and time is
//! a [`glow_primitives::ManualClock`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use glow_simulation::{wallet, TestHarness};
//!
//! #[tokio::test]
//! async fn test_liquid_holder_ranks() {
//!     let mut harness = TestHarness::new();
//!     harness.liquid.set_balance(&wallet(1), 1_000 * GLW);
//!     harness.add_feed("glw_holders", &[wallet(1)]);
//!
//!     let snapshot = harness.materializer().refresh_impact().await.unwrap();
//!     assert_eq!(snapshot.rows[0].rank, 1);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`mocks`]: reusable implementations of the `glow_scoring::sources` traits
//! - [`TestHarness`]: builds engines, materializers and services over the mocks

pub mod harness;
pub mod mocks;

pub use harness::{wallet, TestHarness, DEFAULT_HARNESS_WEEK};
pub use mocks::{
    MockClaimsIndexer, MockLiquidBalance, MockRewardLedger, MockSteering, MockUniverseFeed,
};

/// One GLW in wei.
pub const GLW: u128 = 1_000_000_000_000_000_000;
