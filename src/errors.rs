//! Unified error types for the reconciliation engine.
//!
//! Storage-layer failures are classified at conversion time: transaction
//! aborts caused by a concurrent writer become [`Error::Conflict`] and are
//! eligible for bounded retry; everything else becomes [`Error::Database`].

use sea_orm::DbErr;
use thiserror::Error;

/// Caller-facing classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed caller input; never retried
    Validation,
    /// Referenced obligation or ledger entry does not exist; never retried
    NotFound,
    /// Transaction aborted by a concurrent writer; retryable
    Conflict,
    /// Configuration or database failure outside the taxonomy above
    Other,
}

/// Unified error type for all engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings file or environment variable could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Amount is non-positive or not a finite number
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Caller-supplied field is malformed
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: String,
        /// What was wrong with it
        message: String,
    },

    /// Referenced obligation does not exist or is voided
    #[error("Obligation not found: {reference}")]
    ObligationNotFound {
        /// ID or reference the caller supplied
        reference: String,
    },

    /// Referenced ledger entry does not exist
    #[error("Ledger entry not found: {id}")]
    EntryNotFound {
        /// ID the caller supplied
        id: i64,
    },

    /// Payment exceeds the outstanding balance under the configured policy
    #[error("Payment of {amount} exceeds outstanding balance of {remaining}")]
    OverpaymentRejected {
        /// The rejected payment amount
        amount: f64,
        /// Balance outstanding at the time of the attempt
        remaining: f64,
    },

    /// Reversing this entry would drive the settled total below zero
    #[error("Reversal of {amount} exceeds settled total of {settled}")]
    ReversalExceedsSettled {
        /// Amount of the entry being reversed
        amount: f64,
        /// Settled total recorded on the parent
        settled: f64,
    },

    /// Storage transaction aborted by a concurrent writer
    #[error("Transaction conflict: {message}")]
    Conflict {
        /// Message reported by the storage layer
        message: String,
    },

    /// Any other storage-layer failure
    #[error("Database error: {message}")]
    Database {
        /// Message reported by the storage layer
        message: String,
    },
}

impl Error {
    /// Maps this error onto the caller-facing taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount { .. }
            | Self::Validation { .. }
            | Self::OverpaymentRejected { .. }
            | Self::ReversalExceedsSettled { .. } => ErrorKind::Validation,
            Self::ObligationNotFound { .. } | Self::EntryNotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Config { .. } | Self::Database { .. } => ErrorKind::Other,
        }
    }
}

// Substrings that identify a storage error as a concurrency conflict.
// Covers SQLite busy/locked states and the serialization failures other
// backends report.
const CONFLICT_MARKERS: [&str; 5] = [
    "database is locked",
    "database table is locked",
    "deadlock",
    "could not serialize",
    "serialization failure",
];

fn is_conflict(err: &DbErr) -> bool {
    let text = err.to_string().to_lowercase();
    CONFLICT_MARKERS.iter().any(|marker| text.contains(marker))
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        if is_conflict(&err) {
            Self::Conflict {
                message: err.to_string(),
            }
        } else {
            Self::Database {
                message: err.to_string(),
            }
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
