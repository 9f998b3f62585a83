//! File-backed price source.

use std::path::PathBuf;

use tracing::debug;

use factorsim_primitives::PriceTable;
use factorsim_traits::{PriceSource, SourceError};

use crate::{PanelLayout, UtilsError, read_panel_csv};

impl From<UtilsError> for SourceError {
    fn from(err: UtilsError) -> Self {
        match err {
            UtilsError::Io(e) => Self::Io(e),
            UtilsError::Panel(e) => Self::Panel(e),
            other => Self::Parse(other.to_string()),
        }
    }
}

/// Close prices from a wide CSV file (`date` plus one column per ticker).
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    /// Create a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PriceSource for CsvPriceSource {
    /// Every ticker in the file when `tickers` is empty.
    fn prices(&self, tickers: &[String]) -> Result<PriceTable, SourceError> {
        let table = read_panel_csv(&self.path, Some(PanelLayout::Wide))?;
        debug!(path = %self.path.display(), tickers = table.n_columns(), "loaded prices");
        if tickers.is_empty() {
            return Ok(table);
        }

        let missing = table.missing_columns(tickers);
        if !missing.is_empty() {
            return Err(SourceError::Unavailable(missing));
        }
        Ok(table.select_columns(tickers)?)
    }
}
