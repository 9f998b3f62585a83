//! Weighting scheme trait definitions.

use factorsim_primitives::{Allocation, Date, FactorMatrix, GroupAssignment, PanelError};
use serde::{Deserialize, Serialize};

/// Errors that can occur while turning a factor into portfolio weights.
#[derive(Debug, thiserror::Error)]
pub enum WeightingError {
    /// Tickers required by the computation are missing from a reference table.
    #[error("missing alignment data in {table}: {}", .tickers.join(", "))]
    MissingAlignment {
        /// Table the tickers were looked up in.
        table: String,
        /// Tickers that could not be found.
        tickers: Vec<String>,
    },

    /// Cross-sectional denominator is zero on a date.
    #[error("no eligible exposure on {date}")]
    NoEligibleExposure {
        /// Offending date.
        date: Date,
    },

    /// A group with eligible members sums to zero on a date.
    #[error("no eligible exposure in group {group} on {date}")]
    EmptyGroup {
        /// Offending date.
        date: Date,
        /// Group label.
        group: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Table construction error.
    #[error("table error: {0}")]
    Panel(#[from] PanelError),
}

impl WeightingError {
    /// Returns whether this error stems from the input data rather than the setup.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingAlignment { .. } | Self::NoEligibleExposure { .. } | Self::EmptyGroup { .. }
        )
    }
}

/// Treatment of tickers absent from the group assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Fail with [`WeightingError::MissingAlignment`].
    #[default]
    Strict,
    /// Drop them and report the partition in [`Allocation::reconciliation`].
    DropUnaligned,
}

/// Treatment of dates whose cross-sectional denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDatePolicy {
    /// Fail with [`WeightingError::NoEligibleExposure`] or [`WeightingError::EmptyGroup`].
    #[default]
    Fail,
    /// Hold no position and list the date in [`Allocation::skipped_dates`].
    Flat,
}

/// Data-quality policies applied by a weighting scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationPolicy {
    /// Tickers without a group.
    pub alignment: AlignmentPolicy,
    /// Dates without eligible exposure.
    pub empty_dates: EmptyDatePolicy,
}

/// Converts a (smoothed) factor matrix into portfolio weights.
///
/// Implementations must return weights whose rows sum to `leverage` on every
/// date that is not listed in [`Allocation::skipped_dates`].
pub trait WeightingScheme: Send + Sync {
    /// Short name of the scheme, used in logs and reports.
    fn name(&self) -> &str;

    /// Group assignment the scheme sizes against, if any.
    fn groups(&self) -> Option<&GroupAssignment>;

    /// Size positions for every date of `factor`.
    ///
    /// # Arguments
    /// * `factor` - Signal matrix (date x ticker), missing cells are ineligible
    /// * `leverage` - Target sum of weights per date
    /// * `policy` - Data-quality policies
    ///
    /// # Errors
    /// Returns `WeightingError` on alignment failures, degenerate dates under
    /// [`EmptyDatePolicy::Fail`], or invalid leverage.
    fn allocate(
        &self,
        factor: &FactorMatrix,
        leverage: f64,
        policy: &AllocationPolicy,
    ) -> Result<Allocation, WeightingError>;
}
