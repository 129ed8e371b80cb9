//! In-memory implementations of every collaborator the engine reads from.
//!
//! Each mock is configured up front with `with_*` builders or `add_*`
//! setters and then shared behind an `Arc`. Clones share call counters.

pub mod balance;
pub mod claims;
pub mod ledger;
pub mod steering;
pub mod universe;

pub use balance::MockLiquidBalance;
pub use claims::MockClaimsIndexer;
pub use ledger::MockRewardLedger;
pub use steering::MockSteering;
pub use universe::MockUniverseFeed;
