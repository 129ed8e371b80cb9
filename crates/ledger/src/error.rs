//! Ledger error types.

use glow_types::{FarmId, Week};
use thiserror::Error;

/// Errors raised by the vault ledger and the reconciler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A forward-only cursor was asked for an earlier week than its last query.
    #[error("cursor rewind: requested week {requested} after week {last}")]
    CursorRewind {
        /// Week asked for.
        requested: Week,
        /// Week of the previous query.
        last: Week,
    },

    /// Two split segments for the same farm cover a common week.
    #[error("overlapping split segments for farm {farm_id} at week {week}")]
    OverlappingSegments {
        /// Farm with the overlap.
        farm_id: FarmId,
        /// First week covered twice.
        week: Week,
    },

    /// Segment start is after its end.
    #[error("invalid split segment for farm {farm_id}: {start}..={end}")]
    InvalidSegment {
        /// Farm of the segment.
        farm_id: FarmId,
        /// Segment start.
        start: Week,
        /// Segment end.
        end: Week,
    },

    /// The claims indexer has not finished indexing.
    #[error("claims indexer is still indexing")]
    IndexingIncomplete,
}

/// Result alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
