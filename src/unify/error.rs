//! Unification error types
//!
//! Only structural problems are errors. Missing metrics, short rolling
//! windows and undersized correlation samples are filtered, never raised.

use thiserror::Error;

/// Errors that can occur while reading and normalizing source tables
#[derive(Error, Debug)]
pub enum UnifyError {
    /// A row's date could not be parsed, or the table has no date column
    #[error("Malformed input at row {row}: {reason}")]
    MalformedInput { row: usize, reason: String },

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl UnifyError {
    pub fn malformed(row: usize, reason: impl Into<String>) -> Self {
        UnifyError::MalformedInput {
            row,
            reason: reason.into(),
        }
    }
}

/// Result type alias for unification operations
pub type UnifyResult<T> = Result<T, UnifyError>;
