//! Error types for strategy simulation and evaluation.

use factorsim_math::MathError;
use factorsim_primitives::{Date, PanelError};
use factorsim_traits::WeightingError;

use crate::VariantFailure;

/// Errors that can occur while simulating and evaluating factor strategies.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Weighting error.
    #[error("weighting error: {0}")]
    Weighting(#[from] WeightingError),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Table construction error.
    #[error("table error: {0}")]
    Panel(#[from] PanelError),

    /// Weighted tickers have no realized-return data.
    #[error("missing alignment data in {table}: {}", .tickers.join(", "))]
    MissingAlignment {
        /// Table the tickers were looked up in.
        table: String,
        /// Tickers that could not be found.
        tickers: Vec<String>,
    },

    /// Two decision dates map onto the same trading session after the lag.
    #[error("execution lag maps two decision dates onto {0}")]
    ShiftCollision(Date),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every variant of a batch failed.
    #[error("all {} variants failed", .0.len())]
    AllVariantsFailed(Vec<VariantFailure>),

    /// The reference baseline could not be computed.
    #[error("baseline variant unavailable: {0}")]
    MissingBaseline(String),
}

impl ModelError {
    /// Returns whether this error stems from the input data rather than the setup.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Weighting(e) => e.is_recoverable(),
            Self::Math(e) => e.is_recoverable(),
            Self::MissingAlignment { .. } | Self::ShiftCollision(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::MissingAlignment {
            table: "returns".to_string(),
            tickers: vec!["ZZZ".to_string()],
        };
        assert_eq!(err.to_string(), "missing alignment data in returns: ZZZ");

        let err = ModelError::AllVariantsFailed(vec![]);
        assert_eq!(err.to_string(), "all 0 variants failed");
    }

    #[test]
    fn error_is_recoverable() {
        let err = ModelError::Math(MathError::ZeroVolatility { column: "x".to_string() });
        assert!(err.is_recoverable());

        let err = ModelError::InvalidConfig("test".to_string());
        assert!(!err.is_recoverable());
    }
}
