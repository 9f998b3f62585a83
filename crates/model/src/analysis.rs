//! End-to-end evaluation of one factor.

use serde::{Deserialize, Serialize};
use tracing::info;

use factorsim_math::business_days;
use factorsim_primitives::{FactorMatrix, GroupAssignment, ReturnTable};
use factorsim_traits::{AllocationPolicy, EmptyDatePolicy, WeightingScheme};

use crate::{
    BatchConfig, BatchResult, GroupNeutralWeighting, ModelError, PerformanceTable, RawWeighting,
    StatsConfig, calc_performance, performance_data_list,
};

/// Configuration for [`analyze_factor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Smoothing windows to evaluate.
    pub rolls: Vec<usize>,
    /// Leverage of every factor variant.
    pub leverage: f64,
    /// Additional levered equal-weight baselines.
    pub baseline_leverages: Vec<f64>,
    /// Cost per unit of turnover.
    pub trade_cost: Option<f64>,
    /// Data-quality policies.
    pub policy: AllocationPolicy,
    /// Statistics settings.
    pub stats: StatsConfig,
    /// Run variants in parallel.
    pub parallel: bool,
    /// Conform the factor to every business day between its first and last date.
    pub reindex_business_days: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rolls: vec![2, 5, 8, 10, 13, 15, 100],
            leverage: 1.0,
            baseline_leverages: vec![1.5],
            trade_cost: None,
            // Business-day reindexing leaves holidays without a signal.
            policy: AllocationPolicy {
                empty_dates: EmptyDatePolicy::Flat,
                ..AllocationPolicy::default()
            },
            stats: StatsConfig::default(),
            parallel: true,
            reindex_business_days: true,
        }
    }
}

impl AnalysisConfig {
    /// Batch settings shared by the raw and neutral runs.
    #[must_use]
    pub fn batch(&self) -> BatchConfig {
        BatchConfig {
            rolls: self.rolls.clone(),
            leverage: self.leverage,
            baseline_leverages: self.baseline_leverages.clone(),
            trade_cost: self.trade_cost,
            policy: self.policy,
            parallel: self.parallel,
        }
    }
}

/// A batch and its ranking.
#[derive(Debug)]
pub struct BatchReport {
    /// Variant outputs.
    pub batch: BatchResult,
    /// Variants ranked against the batch's own equal-weight baseline.
    pub performance: PerformanceTable,
}

/// Raw and group-neutral evaluations of one factor.
#[derive(Debug)]
pub struct FactorAnalysis {
    /// Factor name.
    pub factor_name: String,
    /// Factor-proportional weighting.
    pub raw: BatchReport,
    /// Group-neutral weighting, when groups were supplied.
    pub neutral: Option<BatchReport>,
}

/// Evaluate a factor across every configured smoothing window.
///
/// The raw run always happens; with `groups` a second run sizes every group
/// equally. Each run is ranked against its own equal-weight baseline.
///
/// # Errors
/// Returns `ModelError` if the factor is empty, the configuration is invalid,
/// every variant of a run fails, or a run has no baseline.
pub fn analyze_factor(
    name: &str,
    factor: &FactorMatrix,
    returns: &ReturnTable,
    groups: Option<&GroupAssignment>,
    config: &AnalysisConfig,
) -> Result<FactorAnalysis, ModelError> {
    let (Some(&first), Some(&last)) = (factor.dates().first(), factor.dates().last()) else {
        return Err(ModelError::InvalidConfig(format!("factor {name} has no dates")));
    };

    let factor = if config.reindex_business_days {
        factor.reindex_dates(&business_days(first, last))?
    } else {
        factor.clone()
    };
    info!(factor = name, dates = factor.n_dates(), tickers = factor.n_columns(), "analyzing factor");

    let batch = config.batch();
    let run = |scheme: &dyn WeightingScheme| -> Result<BatchReport, ModelError> {
        let batch = performance_data_list(&factor, returns, scheme, &batch)?;
        let performance = calc_performance(&batch.daily, batch.require_baseline()?, &config.stats)?;
        Ok(BatchReport { batch, performance })
    };

    let raw = run(&RawWeighting::new(groups.cloned()))?;
    let neutral = groups.map(|g| run(&GroupNeutralWeighting::new(g.clone()))).transpose()?;

    Ok(FactorAnalysis { factor_name: name.to_string(), raw, neutral })
}

#[cfg(test)]
mod tests {
    use super::*;
    use factorsim_primitives::{Date, Panel};

    fn weekdays(n: usize) -> Vec<Date> {
        let start = Date::from_ymd_opt(2024, 1, 1).unwrap();
        start.iter_days().filter(|d| factorsim_math::is_business_day(*d)).take(n).collect()
    }

    fn inputs() -> (FactorMatrix, ReturnTable) {
        let dates = weekdays(30);
        let factor = Panel::from_columns(
            dates[..29].to_vec(),
            (0..4)
                .map(|j| {
                    let values: Vec<f64> =
                        (0..29).map(|i| 1.0 + ((i * (j + 1)) % 5) as f64).collect();
                    (format!("T{j}"), values)
                })
                .collect(),
        )
        .unwrap();
        let returns = Panel::from_columns(
            dates,
            (0..4)
                .map(|j| {
                    let values: Vec<f64> =
                        (0..30).map(|i| (((i + j) % 7) as f64 - 3.0) / 1000.0).collect();
                    (format!("T{j}"), values)
                })
                .collect(),
        )
        .unwrap();
        (factor, returns)
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig { rolls: vec![2, 5], parallel: false, ..AnalysisConfig::default() }
    }

    #[test]
    fn raw_only_without_groups() {
        let (factor, returns) = inputs();
        let analysis = analyze_factor("value", &factor, &returns, None, &config()).unwrap();

        assert_eq!(analysis.factor_name, "value");
        assert!(analysis.neutral.is_none());
        assert_eq!(
            analysis.raw.batch.labels(),
            &["equal weight", "equal weight 1.5", "roll-none", "roll-2", "roll-5"]
        );
        assert!(analysis.raw.batch.group_weights.is_empty());
        assert_eq!(
            analysis.raw.performance.len() + analysis.raw.performance.excluded.len(),
            5
        );
    }

    #[test]
    fn groups_add_neutral_run() {
        let (factor, returns) = inputs();
        let groups: GroupAssignment =
            [("T0", "A"), ("T1", "A"), ("T2", "B"), ("T3", "B")].into_iter().collect();
        let analysis = analyze_factor("value", &factor, &returns, Some(&groups), &config()).unwrap();

        let neutral = analysis.neutral.unwrap();
        assert_eq!(neutral.batch.labels(), analysis.raw.batch.labels());
        assert_eq!(neutral.batch.group_weights.len(), 5);
        assert_eq!(analysis.raw.batch.group_weights.len(), 5);
    }

    #[test]
    fn weekend_dates_are_dropped_by_reindexing() {
        let (factor, returns) = inputs();
        let (mut dates, columns, values) = factor.into_parts();
        // Move the last row onto a Saturday.
        let last = dates.len() - 1;
        dates[last] = Date::from_ymd_opt(2024, 2, 10).unwrap();
        let factor = Panel::new(dates, columns, values).unwrap();

        let analysis = analyze_factor("value", &factor, &returns, None, &config()).unwrap();
        let daily = &analysis.raw.batch.daily;
        assert!(daily.dates().iter().all(|d| factorsim_math::is_business_day(*d)));
    }

    #[test]
    fn holiday_gaps_do_not_pay_trade_costs() {
        let d = |day| Date::from_ymd_opt(2024, 3, day).unwrap();
        // Wed 6 and Mon 11 are missing from the factor.
        let factor_dates = vec![d(4), d(5), d(7), d(8), d(12), d(13)];
        let factor = Panel::from_columns(
            factor_dates,
            vec![("AAA", vec![1.0; 6]), ("BBB", vec![1.0; 6])],
        )
        .unwrap();
        let return_dates = vec![d(4), d(5), d(6), d(7), d(8), d(11), d(12), d(13), d(14)];
        let returns = Panel::from_columns(
            return_dates,
            vec![("AAA", vec![0.0; 9]), ("BBB", vec![0.0; 9])],
        )
        .unwrap();
        let config = AnalysisConfig {
            rolls: Vec::new(),
            baseline_leverages: Vec::new(),
            trade_cost: Some(0.01),
            parallel: false,
            ..AnalysisConfig::default()
        };

        let batch = analyze_factor("flat", &factor, &returns, None, &config).unwrap().raw.batch;
        assert_eq!(batch.skipped_dates["roll-none"], vec![d(6), d(11)]);

        let roll_none = batch.daily.column("roll-none").unwrap();
        let baseline = batch.daily.column("equal weight").unwrap();
        // Both pay for the opening trade only.
        approx::assert_relative_eq!(roll_none[0], -0.01, epsilon = 1e-12);
        for (i, (r, b)) in roll_none.iter().zip(baseline.iter()).enumerate() {
            approx::assert_relative_eq!(*r, *b, epsilon = 1e-12);
            if i > 0 {
                approx::assert_relative_eq!(*r, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn empty_factor_is_rejected() {
        let (_, returns) = inputs();
        let factor = Panel::from_columns(Vec::new(), vec![("T0", Vec::new())]).unwrap();
        let err = analyze_factor("empty", &factor, &returns, None, &config());
        assert!(matches!(err, Err(ModelError::InvalidConfig(_))));
    }
}
