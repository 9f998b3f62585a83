//! Output of a weighting scheme.

use crate::{Date, GroupWeights, PortfolioWeights, Reconciliation};

/// Portfolio weights produced from a factor matrix, with exposure diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Normalized, levered weights (date x ticker). Ineligible cells are 0.
    pub weights: PortfolioWeights,
    /// Per-group weight sums (date x group), present when groups were supplied.
    pub group_weights: Option<GroupWeights>,
    /// Ticker partition against the group assignment, when groups were supplied.
    pub reconciliation: Option<Reconciliation>,
    /// Dates held flat because no exposure was eligible.
    pub skipped_dates: Vec<Date>,
}

impl Allocation {
    /// Allocation without any group information.
    #[must_use]
    pub const fn ungrouped(weights: PortfolioWeights) -> Self {
        Self { weights, group_weights: None, reconciliation: None, skipped_dates: Vec::new() }
    }

    /// Total weight held on each date.
    #[must_use]
    pub fn gross_exposure(&self) -> Vec<f64> {
        self.weights.values().rows().into_iter().map(|row| row.sum()).collect()
    }
}
