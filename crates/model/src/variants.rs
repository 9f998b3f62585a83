//! Variant orchestration: run one factor through several smoothing windows.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use factorsim_math::equal_weight;
use factorsim_primitives::{
    Date, FactorMatrix, GroupWeights, Panel, Reconciliation, ReturnSeries, ReturnTable,
};
use factorsim_traits::{AllocationPolicy, WeightingScheme};

use crate::{
    ModelError, SimulatedReturns, WeightingConfig, calc_allocation_returns, factor_strategy,
};

/// Label of the unlevered equal-weight baseline.
pub const EQUAL_WEIGHT_LABEL: &str = "equal weight";

/// Label synthesized for a smoothing window.
#[must_use]
pub fn roll_label(window: Option<usize>) -> String {
    window.map_or_else(|| "roll-none".to_string(), |w| format!("roll-{w}"))
}

/// Label of an equal-weight baseline at `leverage`.
#[must_use]
pub fn baseline_label(leverage: f64) -> String {
    format!("{EQUAL_WEIGHT_LABEL} {leverage}")
}

/// Configuration of a single strategy variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Explicit label; derived from the window when unset.
    pub label: Option<String>,
    /// Trailing smoothing window.
    pub roll_days: Option<usize>,
    /// Target sum of weights per date.
    pub leverage: f64,
    /// Cost per unit of turnover.
    pub trade_cost: Option<f64>,
    /// Data-quality policies.
    pub policy: AllocationPolicy,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            label: None,
            roll_days: None,
            leverage: 1.0,
            trade_cost: None,
            policy: AllocationPolicy::default(),
        }
    }
}

impl StrategyConfig {
    /// Label used for this variant's output columns.
    #[must_use]
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| roll_label(self.roll_days))
    }

    /// Weighting part of the configuration.
    #[must_use]
    pub const fn weighting(&self) -> WeightingConfig {
        WeightingConfig { roll_days: self.roll_days, leverage: self.leverage, policy: self.policy }
    }
}

/// Labeled output of one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantResult {
    /// Variant label.
    pub label: String,
    /// Daily and compounded returns, both named by the label.
    pub returns: SimulatedReturns,
    /// Per-group exposure, when the scheme carries groups.
    pub group_weights: Option<GroupWeights>,
    /// Ticker partition against the groups, when the scheme carries groups.
    pub reconciliation: Option<Reconciliation>,
    /// Dates held flat.
    pub skipped_dates: Vec<Date>,
}

/// Weight a factor with `scheme` and simulate the result.
///
/// # Errors
/// Returns `ModelError` from weighting or simulation.
pub fn performance_data<S: WeightingScheme + ?Sized>(
    factor: &FactorMatrix,
    returns: &ReturnTable,
    scheme: &S,
    config: &StrategyConfig,
) -> Result<VariantResult, ModelError> {
    let label = config.label();
    let allocation = factor_strategy(factor, scheme, &config.weighting())?;
    let simulated = calc_allocation_returns(&allocation, returns, config.trade_cost)?;
    debug!(%label, scheme = scheme.name(), "simulated variant");

    Ok(VariantResult {
        returns: simulated.renamed(&label),
        label,
        group_weights: allocation.group_weights,
        reconciliation: allocation.reconciliation,
        skipped_dates: allocation.skipped_dates,
    })
}

/// Configuration of a batch of variants over one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Smoothing windows, one variant each.
    pub rolls: Vec<usize>,
    /// Leverage of every factor variant and of the main baseline.
    pub leverage: f64,
    /// Additional equal-weight baselines at these leverages.
    pub baseline_leverages: Vec<f64>,
    /// Cost per unit of turnover, shared by all variants.
    pub trade_cost: Option<f64>,
    /// Data-quality policies, shared by all variants.
    pub policy: AllocationPolicy,
    /// Run variants on the rayon pool.
    pub parallel: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            rolls: Vec::new(),
            leverage: 1.0,
            baseline_leverages: Vec::new(),
            trade_cost: None,
            policy: AllocationPolicy::default(),
            parallel: true,
        }
    }
}

/// Input signal of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantSignal {
    /// Uniform signal over the factor's dates and tickers.
    EqualWeight,
    /// The factor itself.
    Factor,
}

/// One planned variant of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSpec {
    /// Signal to weight.
    pub signal: VariantSignal,
    /// Strategy parameters, with the label already set.
    pub config: StrategyConfig,
}

impl BatchConfig {
    /// Expand into the ordered variant list: baseline, levered baselines,
    /// unsmoothed factor, then one variant per window.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for a zero window or duplicate labels.
    pub fn variants(&self) -> Result<Vec<VariantSpec>, ModelError> {
        if self.rolls.contains(&0) {
            return Err(ModelError::InvalidConfig("smoothing windows must be positive".to_string()));
        }

        let strategy = |label: String, roll_days, leverage| StrategyConfig {
            label: Some(label),
            roll_days,
            leverage,
            trade_cost: self.trade_cost,
            policy: self.policy,
        };

        let baselines = std::iter::once((EQUAL_WEIGHT_LABEL.to_string(), self.leverage))
            .chain(self.baseline_leverages.iter().map(|&l| (baseline_label(l), l)))
            .map(|(label, leverage)| VariantSpec {
                signal: VariantSignal::EqualWeight,
                config: strategy(label, None, leverage),
            });

        let windows = std::iter::once(None).chain(self.rolls.iter().map(|&w| Some(w))).map(|w| {
            VariantSpec {
                signal: VariantSignal::Factor,
                config: strategy(roll_label(w), w, self.leverage),
            }
        });

        let specs: Vec<_> = baselines.chain(windows).collect();

        let mut seen = BTreeSet::new();
        for spec in &specs {
            let label = spec.config.label();
            if !seen.insert(label.clone()) {
                return Err(ModelError::InvalidConfig(format!("duplicate variant label {label}")));
            }
        }
        Ok(specs)
    }
}

/// A variant that failed, with its cause.
#[derive(Debug, thiserror::Error)]
#[error("{label}: {error}")]
pub struct VariantFailure {
    /// Variant label.
    pub label: String,
    /// Cause.
    pub error: ModelError,
}

/// Wide outputs of a batch, one column per successful variant.
#[derive(Debug)]
pub struct BatchResult {
    /// Compounded returns, union of variant dates, gaps left missing.
    pub cumulative: ReturnTable,
    /// Daily returns, union of variant dates, gaps left missing.
    pub daily: ReturnTable,
    /// Group exposure per variant label.
    pub group_weights: BTreeMap<String, GroupWeights>,
    /// Ticker partition per variant label.
    pub reconciliations: BTreeMap<String, Reconciliation>,
    /// Dates held flat per variant label, for variants that skipped any.
    pub skipped_dates: BTreeMap<String, Vec<Date>>,
    /// Daily returns of the equal-weight baseline, if it succeeded.
    pub baseline: Option<ReturnSeries>,
    /// Variants that failed, in batch order.
    pub failures: Vec<VariantFailure>,
}

impl BatchResult {
    /// Labels of the successful variants, in batch order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        self.daily.columns()
    }

    /// The baseline series or an error naming why it is absent.
    ///
    /// # Errors
    /// Returns `ModelError::MissingBaseline` if the baseline variant failed.
    pub fn require_baseline(&self) -> Result<&ReturnSeries, ModelError> {
        self.baseline.as_ref().ok_or_else(|| {
            let cause = self
                .failures
                .iter()
                .find(|f| f.label == EQUAL_WEIGHT_LABEL)
                .map_or_else(|| "not run".to_string(), |f| f.error.to_string());
            ModelError::MissingBaseline(cause)
        })
    }
}

/// Run the baseline, the unsmoothed factor and every smoothing window.
///
/// Variants are independent: a failing variant is logged and recorded in
/// [`BatchResult::failures`] while the rest continue. With
/// [`BatchConfig::parallel`] they run on the rayon pool; output order is
/// always the order of [`BatchConfig::variants`].
///
/// # Errors
/// * `ModelError::InvalidConfig` - invalid batch configuration
/// * `ModelError::AllVariantsFailed` - no variant produced returns
pub fn performance_data_list<S: WeightingScheme + ?Sized>(
    factor: &FactorMatrix,
    returns: &ReturnTable,
    scheme: &S,
    config: &BatchConfig,
) -> Result<BatchResult, ModelError> {
    let specs = config.variants()?;
    let baseline_signal = equal_weight(factor.dates(), factor.columns())?;

    let run = |spec: &VariantSpec| {
        let signal = match spec.signal {
            VariantSignal::EqualWeight => &baseline_signal,
            VariantSignal::Factor => factor,
        };
        performance_data(signal, returns, scheme, &spec.config).map_err(|error| VariantFailure {
            label: spec.config.label(),
            error,
        })
    };

    info!(scheme = scheme.name(), variants = specs.len(), parallel = config.parallel, "running batch");
    let outcomes: Vec<_> = if config.parallel {
        specs.par_iter().map(run).collect()
    } else {
        specs.iter().map(run).collect()
    };

    let mut daily = Vec::new();
    let mut cumulative = Vec::new();
    let mut group_weights = BTreeMap::new();
    let mut reconciliations = BTreeMap::new();
    let mut skipped_dates = BTreeMap::new();
    let mut baseline = None;
    let mut failures = Vec::new();

    for outcome in outcomes {
        let variant = match outcome {
            Ok(variant) => variant,
            Err(failure) => {
                warn!(label = %failure.label, error = %failure.error, "variant failed");
                failures.push(failure);
                continue;
            }
        };

        if variant.label == EQUAL_WEIGHT_LABEL {
            baseline = Some(variant.returns.daily.clone());
        }
        if let Some(gw) = variant.group_weights {
            group_weights.insert(variant.label.clone(), gw);
        }
        if let Some(rec) = variant.reconciliation {
            reconciliations.insert(variant.label.clone(), rec);
        }
        if !variant.skipped_dates.is_empty() {
            skipped_dates.insert(variant.label.clone(), variant.skipped_dates);
        }
        daily.push(variant.returns.daily);
        cumulative.push(variant.returns.cumulative);
    }

    if daily.is_empty() {
        return Err(ModelError::AllVariantsFailed(failures));
    }

    Ok(BatchResult {
        cumulative: Panel::from_series(&cumulative)?,
        daily: Panel::from_series(&daily)?,
        group_weights,
        reconciliations,
        skipped_dates,
        baseline,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;
    use crate::{GroupNeutralWeighting, RawWeighting};
    use factorsim_primitives::GroupAssignment;

    const NAN: f64 = f64::NAN;

    fn dates() -> Vec<Date> {
        // Mon 1 .. Fri 5 April 2024, then Mon 8.
        [1, 2, 3, 4, 5, 8].iter().map(|&d| Date::from_ymd_opt(2024, 4, d).unwrap()).collect()
    }

    fn factor() -> FactorMatrix {
        Panel::from_columns(
            dates(),
            vec![
                ("AAA", vec![1.0, 2.0, NAN, 1.0, 3.0, 2.0]),
                ("BBB", vec![2.0, 1.0, 1.0, NAN, 1.0, 1.0]),
                ("CCC", vec![1.0, 1.0, 2.0, 2.0, 1.0, 3.0]),
            ],
        )
        .unwrap()
    }

    fn returns() -> ReturnTable {
        let mut dates = dates();
        dates.push(Date::from_ymd_opt(2024, 4, 9).unwrap());
        Panel::from_columns(
            dates,
            vec![
                ("AAA", vec![0.0, 0.01, -0.02, 0.015, 0.0, 0.01, -0.01]),
                ("BBB", vec![0.0, -0.01, 0.01, 0.02, -0.005, 0.0, 0.02]),
                ("CCC", vec![0.0, 0.02, 0.0, -0.01, 0.01, 0.005, 0.0]),
            ],
        )
        .unwrap()
    }

    fn batch(rolls: Vec<usize>) -> BatchConfig {
        BatchConfig { rolls, parallel: false, ..BatchConfig::default() }
    }

    #[rstest]
    #[case(None, "roll-none")]
    #[case(Some(5), "roll-5")]
    fn labels_follow_window(#[case] window: Option<usize>, #[case] expected: &str) {
        assert_eq!(roll_label(window), expected);
        let config = StrategyConfig { roll_days: window, ..StrategyConfig::default() };
        assert_eq!(config.label(), expected);
    }

    #[test]
    fn explicit_label_wins() {
        let config = StrategyConfig { label: Some("mine".to_string()), ..StrategyConfig::default() };
        assert_eq!(config.label(), "mine");
    }

    #[test]
    fn variant_order_and_labels() {
        let config = BatchConfig { baseline_leverages: vec![1.5], ..batch(vec![2, 5]) };
        let labels: Vec<_> = config.variants().unwrap().iter().map(|v| v.config.label()).collect();
        assert_eq!(labels, ["equal weight", "equal weight 1.5", "roll-none", "roll-2", "roll-5"]);
    }

    #[rstest]
    #[case(vec![2, 2])]
    #[case(vec![0])]
    fn invalid_windows(#[case] rolls: Vec<usize>) {
        assert!(matches!(batch(rolls).variants(), Err(ModelError::InvalidConfig(_))));
    }

    #[test]
    fn performance_data_labels_every_output() {
        let config = StrategyConfig { roll_days: Some(2), ..StrategyConfig::default() };
        let result =
            performance_data(&factor(), &returns(), &RawWeighting::default(), &config).unwrap();
        assert_eq!(result.label, "roll-2");
        assert_eq!(result.returns.daily.name(), "roll-2");
        assert_eq!(result.returns.cumulative.name(), "roll-2");
        assert!(result.group_weights.is_none());
    }

    #[test]
    fn batch_collects_every_variant() {
        let result =
            performance_data_list(&factor(), &returns(), &RawWeighting::default(), &batch(vec![2, 3]))
                .unwrap();
        assert_eq!(result.labels(), &["equal weight", "roll-none", "roll-2", "roll-3"]);
        assert!(result.failures.is_empty());
        assert_eq!(result.cumulative.columns(), result.daily.columns());

        let baseline = result.require_baseline().unwrap();
        assert_eq!(baseline.name(), EQUAL_WEIGHT_LABEL);
        assert_relative_eq!(baseline.values()[0], (0.01 - 0.01 + 0.02) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn parallel_matches_sequential() {
        let scheme = RawWeighting::default();
        let seq = performance_data_list(&factor(), &returns(), &scheme, &batch(vec![2, 4])).unwrap();
        let par_config = BatchConfig { parallel: true, ..batch(vec![2, 4]) };
        let par = performance_data_list(&factor(), &returns(), &scheme, &par_config).unwrap();
        assert_eq!(seq.daily, par.daily);
        assert_eq!(seq.cumulative, par.cumulative);
    }

    #[test]
    fn failing_variant_is_isolated() {
        // Unsmoothed factor has a date with no signal; smoothed variants fill it.
        let sparse = Panel::from_columns(
            dates(),
            vec![
                ("AAA", vec![1.0, NAN, 1.0, 1.0, 1.0, 1.0]),
                ("BBB", vec![1.0, NAN, 2.0, 1.0, 1.0, 1.0]),
                ("CCC", vec![1.0, NAN, 1.0, 3.0, 1.0, 1.0]),
            ],
        )
        .unwrap();
        let result =
            performance_data_list(&sparse, &returns(), &RawWeighting::default(), &batch(vec![2]))
                .unwrap();

        assert_eq!(result.labels(), &["equal weight", "roll-2"]);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].label, "roll-none");
        assert!(result.failures[0].error.is_recoverable());
    }

    #[test]
    fn all_failures_fail_the_batch() {
        let groups: GroupAssignment = [("AAA", "Tech")].into_iter().collect();
        let err = performance_data_list(
            &factor(),
            &returns(),
            &GroupNeutralWeighting::new(groups),
            &batch(vec![2]),
        );
        match err {
            Err(ModelError::AllVariantsFailed(failures)) => assert_eq!(failures.len(), 3),
            other => panic!("expected all variants to fail, got {other:?}"),
        }
    }

    #[test]
    fn neutral_batch_reports_group_weights() {
        let groups: GroupAssignment =
            [("AAA", "Tech"), ("BBB", "Tech"), ("CCC", "Energy")].into_iter().collect();
        let result = performance_data_list(
            &factor(),
            &returns(),
            &GroupNeutralWeighting::new(groups),
            &batch(vec![3]),
        )
        .unwrap();

        assert_eq!(
            result.group_weights.keys().collect::<Vec<_>>(),
            ["equal weight", "roll-3", "roll-none"]
        );
        for gw in result.group_weights.values() {
            assert!(gw.values().iter().all(|&w| (w - 0.5).abs() < 1e-12));
        }
        assert!(result.reconciliations.values().all(Reconciliation::is_complete));
    }
}
