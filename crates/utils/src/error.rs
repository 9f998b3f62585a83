//! Error types for frame conversion and file I/O.

use factorsim_primitives::PanelError;

/// Errors that can occur while converting frames or reading files.
#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Table construction error.
    #[error("table error: {0}")]
    Panel(#[from] PanelError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing column.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// A date cell could not be interpreted.
    #[error("invalid date in column {column}: {value}")]
    InvalidDate {
        /// Column name.
        column: String,
        /// Offending value.
        value: String,
    },

    /// A (date, symbol) pair appears more than once in a long frame.
    #[error("duplicate entry for {symbol} on {date}")]
    DuplicateEntry {
        /// Date of the repeated row.
        date: String,
        /// Symbol of the repeated row.
        symbol: String,
    },

    /// A symbol is assigned to more than one group.
    #[error("symbol {symbol} assigned to both {first} and {second}")]
    ConflictingGroup {
        /// Symbol.
        symbol: String,
        /// Group seen first.
        first: String,
        /// Group seen later.
        second: String,
    },

    /// Invalid parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
