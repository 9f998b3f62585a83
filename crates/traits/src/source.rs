//! Price source trait definitions.

use factorsim_primitives::{PanelError, PriceTable};

/// Errors that can occur while retrieving prices.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Requested tickers are not available from the source.
    #[error("no prices for: {}", .0.join(", "))]
    Unavailable(Vec<String>),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Data could not be parsed into a price table.
    #[error("parse error: {0}")]
    Parse(String),

    /// Table construction error.
    #[error("table error: {0}")]
    Panel(#[from] PanelError),
}

/// Supplies a date x ticker close-price table.
pub trait PriceSource {
    /// Retrieve close prices for `tickers`, one column per ticker.
    ///
    /// # Errors
    /// Returns `SourceError` if any ticker is unavailable or the data is malformed.
    fn prices(&self, tickers: &[String]) -> Result<PriceTable, SourceError>;
}
