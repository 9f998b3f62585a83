//! Error types for table construction.

use crate::Date;

/// Errors raised when a table's index is inconsistent with its values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// Index lengths do not match the value matrix.
    #[error("shape mismatch: index is {dates} x {columns}, values are {rows} x {cols}")]
    ShapeMismatch {
        /// Number of dates in the index.
        dates: usize,
        /// Number of column labels.
        columns: usize,
        /// Rows in the value matrix.
        rows: usize,
        /// Columns in the value matrix.
        cols: usize,
    },

    /// Date axis is not strictly increasing.
    #[error("dates must be strictly increasing: {previous} is followed by {next}")]
    UnorderedDates {
        /// Earlier position in the axis.
        previous: Date,
        /// Offending date.
        next: Date,
    },

    /// Column label used twice.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    /// Column label not present in the table.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}
