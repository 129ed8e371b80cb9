//! Scoring errors.

use crate::sources::SourceError;
use glow_ledger::LedgerError;
use glow_primitives::RangeError;
use thiserror::Error;

/// Errors produced while scoring a wallet.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Caller asked for an impossible week range.
    #[error("invalid week range: {0}")]
    InvalidRange(#[from] RangeError),

    /// Ledger rejected the wallet's data.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A required source failed and no fallback exists.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Metrics registration failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ScoringError {
    /// Whether the caller caused the error (maps to a 4xx response).
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidRange(_))
    }
}

/// Result alias for scoring operations.
pub type Result<T> = std::result::Result<T, ScoringError>;
