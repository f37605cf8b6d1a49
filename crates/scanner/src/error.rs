//! Error types for the scanner.

use rust_decimal::Decimal;
use thiserror::Error;

/// Failures surfaced while scanning a shard or reconciling a pass.
///
/// Shard-level variants are logged and absorbed; only a failed sweep is
/// returned to the caller of a pass.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A source collection could not be queried.
    #[error("fetch failed for {collection}: {competition} on {date}")]
    Fetch {
        collection: String,
        date: String,
        competition: String,
        #[source]
        source: anyhow::Error,
    },

    /// A value bet write was not confirmed by the store.
    #[error("failed to persist value bet {id}")]
    Persist {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// Existing ids of a failed shard could not be looked up.
    #[error("failed to protect {competition} on {date} from the sweep")]
    Protect {
        date: String,
        competition: String,
        #[source]
        source: anyhow::Error,
    },

    /// Deleting stale value bets failed.
    #[error("sweep of stale value bets failed")]
    Sweep(#[source] anyhow::Error),
}

/// Why a market could not be de-vigged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Odds must be strictly positive.
    #[error("odds at condition {index} must be positive, got {odds}")]
    NonPositive { index: usize, odds: Decimal },

    /// Implied probabilities could not be represented.
    #[error("implied probability overflow at condition {index}")]
    Overflow { index: usize },
}
