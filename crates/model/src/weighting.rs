//! Factor to portfolio weight conversion.
//!
//! Two schemes share the [`WeightingScheme`] interface:
//! - [`RawWeighting`] sizes positions in proportion to the factor itself.
//! - [`GroupNeutralWeighting`] first rescales the factor so every group carries
//!   the same total exposure.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use factorsim_math::roll;
use factorsim_primitives::{
    Allocation, Date, FactorMatrix, GroupAssignment, GroupWeights, Panel, PortfolioWeights,
    Reconciliation,
};
use factorsim_traits::{
    AlignmentPolicy, AllocationPolicy, EmptyDatePolicy, WeightingError, WeightingScheme,
};

use crate::ModelError;

/// Per-call weighting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightingConfig {
    /// Trailing smoothing window applied before sizing (None to disable).
    pub roll_days: Option<usize>,
    /// Target sum of weights per date.
    pub leverage: f64,
    /// Data-quality policies.
    pub policy: AllocationPolicy,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self { roll_days: None, leverage: 1.0, policy: AllocationPolicy::default() }
    }
}

/// Smooth a factor and convert it into portfolio weights with `scheme`.
///
/// # Errors
/// Returns `ModelError` if smoothing fails or the scheme rejects the data.
pub fn factor_strategy<S: WeightingScheme + ?Sized>(
    factor: &FactorMatrix,
    scheme: &S,
    config: &WeightingConfig,
) -> Result<Allocation, ModelError> {
    let rolled = roll(factor, config.roll_days)?;
    let allocation = scheme.allocate(&rolled, config.leverage, &config.policy)?;
    debug!(
        scheme = scheme.name(),
        roll_days = ?config.roll_days,
        skipped = allocation.skipped_dates.len(),
        "allocated factor"
    );
    Ok(allocation)
}

/// Weights proportional to the factor value.
///
/// With a group assignment, tickers are reconciled against it and per-group
/// exposure is reported, but larger or denser groups still dominate.
#[derive(Debug, Clone, Default)]
pub struct RawWeighting {
    groups: Option<GroupAssignment>,
}

impl RawWeighting {
    /// Create a raw scheme, optionally reporting exposure by group.
    #[must_use]
    pub const fn new(groups: Option<GroupAssignment>) -> Self {
        Self { groups }
    }

    /// Raw scheme that reports exposure by `groups`.
    #[must_use]
    pub const fn grouped(groups: GroupAssignment) -> Self {
        Self::new(Some(groups))
    }
}

impl WeightingScheme for RawWeighting {
    fn name(&self) -> &str {
        "raw"
    }

    fn groups(&self) -> Option<&GroupAssignment> {
        self.groups.as_ref()
    }

    fn allocate(
        &self,
        factor: &FactorMatrix,
        leverage: f64,
        policy: &AllocationPolicy,
    ) -> Result<Allocation, WeightingError> {
        validate_leverage(leverage)?;

        let Some(groups) = &self.groups else {
            let mut flat = BTreeSet::new();
            let weights = normalize(factor, leverage, policy.empty_dates, &mut flat)?;
            return Ok(Allocation {
                skipped_dates: dates_at(factor, &flat),
                ..Allocation::ungrouped(weights)
            });
        };

        let (aligned, reconciliation) = reconcile(factor, groups, policy.alignment)?;
        let index = GroupIndex::new(aligned.columns(), groups)?;

        let mut flat = BTreeSet::new();
        let weights = normalize(&aligned, leverage, policy.empty_dates, &mut flat)?;
        let group_weights = index.sum(&weights)?;

        Ok(Allocation {
            weights,
            group_weights: Some(group_weights),
            reconciliation: Some(reconciliation),
            skipped_dates: dates_at(factor, &flat),
        })
    }
}

/// Weights that give every group with eligible members the same total exposure.
///
/// Each ticker's value is divided by the sum of its group's values on that
/// date before the cross-sectional normalization, so with `n` groups present
/// each group ends up holding `leverage / n`.
#[derive(Debug, Clone)]
pub struct GroupNeutralWeighting {
    groups: GroupAssignment,
}

impl GroupNeutralWeighting {
    /// Create a group-neutral scheme.
    #[must_use]
    pub const fn new(groups: GroupAssignment) -> Self {
        Self { groups }
    }

    fn neutralize(
        &self,
        factor: &FactorMatrix,
        index: &GroupIndex,
        policy: EmptyDatePolicy,
        flat: &mut BTreeSet<usize>,
    ) -> Result<FactorMatrix, WeightingError> {
        let values = factor.values();
        let mut out = Array2::from_elem(values.dim(), f64::NAN);

        for (i, row) in values.rows().into_iter().enumerate() {
            let mut sums = vec![0.0; index.labels.len()];
            let mut members = vec![false; index.labels.len()];
            for (j, v) in row.iter().enumerate().filter(|(_, v)| !v.is_nan()) {
                sums[index.member_of[j]] += v;
                members[index.member_of[j]] = true;
            }

            let empty = (0..sums.len()).find(|&g| members[g] && sums[g] == 0.0);
            if let Some(g) = empty {
                let date = factor.dates()[i];
                match policy {
                    EmptyDatePolicy::Fail => {
                        return Err(WeightingError::EmptyGroup {
                            date,
                            group: index.labels[g].clone(),
                        });
                    }
                    EmptyDatePolicy::Flat => {
                        warn!(%date, group = %index.labels[g], "group has no net exposure, holding flat");
                        flat.insert(i);
                        continue;
                    }
                }
            }

            for (j, v) in row.iter().enumerate().filter(|(_, v)| !v.is_nan()) {
                out[[i, j]] = v / sums[index.member_of[j]];
            }
        }

        Ok(factor.with_values(out)?)
    }
}

impl WeightingScheme for GroupNeutralWeighting {
    fn name(&self) -> &str {
        "group-neutral"
    }

    fn groups(&self) -> Option<&GroupAssignment> {
        Some(&self.groups)
    }

    fn allocate(
        &self,
        factor: &FactorMatrix,
        leverage: f64,
        policy: &AllocationPolicy,
    ) -> Result<Allocation, WeightingError> {
        validate_leverage(leverage)?;

        let (aligned, reconciliation) = reconcile(factor, &self.groups, policy.alignment)?;
        let index = GroupIndex::new(aligned.columns(), &self.groups)?;

        let mut flat = BTreeSet::new();
        let neutral = self.neutralize(&aligned, &index, policy.empty_dates, &mut flat)?;
        let weights = normalize(&neutral, leverage, policy.empty_dates, &mut flat)?;
        let group_weights = index.sum(&weights)?;

        Ok(Allocation {
            weights,
            group_weights: Some(group_weights),
            reconciliation: Some(reconciliation),
            skipped_dates: dates_at(factor, &flat),
        })
    }
}

/// Column to group mapping for a reconciled universe.
#[derive(Debug)]
struct GroupIndex {
    /// Distinct group labels, sorted.
    labels: Vec<String>,
    /// Position in `labels` for each column.
    member_of: Vec<usize>,
}

impl GroupIndex {
    fn new(columns: &[String], groups: &GroupAssignment) -> Result<Self, WeightingError> {
        let mut names = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        for ticker in columns {
            match groups.group_of(ticker) {
                Some(group) => names.push(group),
                None => missing.push(ticker.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(WeightingError::MissingAlignment {
                table: "groups".to_string(),
                tickers: missing,
            });
        }

        let positions: BTreeMap<&str, usize> = names
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, g)| (g, i))
            .collect();

        Ok(Self {
            labels: positions.keys().map(|g| g.to_string()).collect(),
            member_of: names.iter().map(|g| positions[g]).collect(),
        })
    }

    /// Sum member weights per date and group.
    fn sum(&self, weights: &PortfolioWeights) -> Result<GroupWeights, WeightingError> {
        let mut out = Array2::zeros((weights.n_dates(), self.labels.len()));
        for (i, row) in weights.values().rows().into_iter().enumerate() {
            for (j, w) in row.iter().enumerate() {
                out[[i, self.member_of[j]]] += w;
            }
        }
        Ok(Panel::new(weights.dates().to_vec(), self.labels.clone(), out)?)
    }
}

fn validate_leverage(leverage: f64) -> Result<(), WeightingError> {
    if leverage.is_finite() {
        Ok(())
    } else {
        Err(WeightingError::InvalidConfig(format!("leverage must be finite, got {leverage}")))
    }
}

/// Restrict the factor to tickers that have a group.
fn reconcile(
    factor: &FactorMatrix,
    groups: &GroupAssignment,
    policy: AlignmentPolicy,
) -> Result<(FactorMatrix, Reconciliation), WeightingError> {
    let reconciliation = groups.reconcile(factor.columns());
    if !reconciliation.is_complete() {
        match policy {
            AlignmentPolicy::Strict => {
                return Err(WeightingError::MissingAlignment {
                    table: "groups".to_string(),
                    tickers: reconciliation.unaligned,
                });
            }
            AlignmentPolicy::DropUnaligned => {
                warn!(
                    dropped = reconciliation.unaligned.len(),
                    "dropping tickers without a group assignment"
                );
            }
        }
    }

    let aligned = factor.select_columns(&reconciliation.aligned)?;
    Ok((aligned, reconciliation))
}

/// Divide each date by its cross-sectional sum and scale by `leverage`.
///
/// Missing cells and rows listed in `flat` get weight 0.
fn normalize(
    factor: &FactorMatrix,
    leverage: f64,
    policy: EmptyDatePolicy,
    flat: &mut BTreeSet<usize>,
) -> Result<PortfolioWeights, WeightingError> {
    let values = factor.values();
    let mut out = Array2::zeros(values.dim());

    for (i, row) in values.rows().into_iter().enumerate() {
        if flat.contains(&i) {
            continue;
        }

        let total: f64 = row.iter().filter(|v| !v.is_nan()).sum();
        if total == 0.0 {
            let date = factor.dates()[i];
            match policy {
                EmptyDatePolicy::Fail => return Err(WeightingError::NoEligibleExposure { date }),
                EmptyDatePolicy::Flat => {
                    warn!(%date, "no eligible exposure, holding flat");
                    flat.insert(i);
                    continue;
                }
            }
        }

        for (j, v) in row.iter().enumerate().filter(|(_, v)| !v.is_nan()) {
            out[[i, j]] = v / total * leverage;
        }
    }

    Ok(factor.with_values(out)?)
}

fn dates_at(factor: &FactorMatrix, rows: &BTreeSet<usize>) -> Vec<Date> {
    rows.iter().map(|&i| factor.dates()[i]).collect()
}
