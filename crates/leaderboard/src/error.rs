//! Leaderboard errors

use glow_scoring::{ScoringError, SourceError};
use glow_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    /// Every universe feed failed
    #[error("Wallet universe unavailable: {0}")]
    Universe(SourceError),

    /// Region rewards could not be synced for any week
    #[error("Steering sync failed: {0}")]
    Steering(SourceError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, LeaderboardError>;
