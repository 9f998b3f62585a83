//! Error types for mathematical operations.

use factorsim_primitives::{Date, PanelError};

/// Errors that can occur during mathematical operations.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// Smoothing window must cover at least one observation.
    #[error("invalid smoothing window: {0} (must be at least 1)")]
    InvalidWindow(usize),

    /// Standard deviation is zero, so a risk-adjusted ratio is undefined.
    #[error("zero volatility in column {column}")]
    ZeroVolatility {
        /// Column label.
        column: String,
    },

    /// Not enough observations for the requested estimator.
    #[error("insufficient data in column {column}: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Column label.
        column: String,
        /// Required number of observations.
        required: usize,
        /// Actual number of observations.
        actual: usize,
    },

    /// Date arithmetic left the representable range.
    #[error("date out of range after {0}")]
    DateOverflow(Date),

    /// Table construction error.
    #[error("table error: {0}")]
    Panel(#[from] PanelError),
}

impl MathError {
    /// Returns whether this error stems from degenerate data rather than bad arguments.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ZeroVolatility { .. } | Self::InsufficientData { .. })
    }
}
