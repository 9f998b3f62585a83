//! Ranked performance summary of a batch.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use factorsim_math::{
    MathError, annualized_volatility, cumulative_returns, sharpe_ratio, worst_drawdown,
};
use factorsim_primitives::{Periodicity, ReturnSeries, ReturnTable};

use crate::ModelError;

/// Statistics settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Sampling frequency of the returns.
    pub periodicity: Periodicity,
    /// Delta degrees of freedom of the standard deviation.
    pub ddof: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { periodicity: Periodicity::Daily, ddof: 1 }
    }
}

/// Summary statistics of one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRow {
    /// Variant label.
    pub label: String,
    /// Annualized Sharpe ratio against the reference series.
    pub sharpe: f64,
    /// Annualized volatility.
    pub volatility: f64,
    /// Deepest drawdown of the compounded returns.
    pub max_drawdown: f64,
}

/// A variant left out of the ranking.
#[derive(Debug)]
pub struct ExcludedVariant {
    /// Variant label.
    pub label: String,
    /// Why its statistics are undefined.
    pub error: MathError,
}

/// Variants ranked by Sharpe ratio, ascending.
#[derive(Debug, Default)]
pub struct PerformanceTable {
    /// Ranked rows.
    pub rows: Vec<PerformanceRow>,
    /// Variants with degenerate statistics.
    pub excluded: Vec<ExcludedVariant>,
}

impl PerformanceTable {
    /// Row for `label`, if it was ranked.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&PerformanceRow> {
        self.rows.iter().find(|row| row.label == label)
    }

    /// Highest-Sharpe variant.
    #[must_use]
    pub fn best(&self) -> Option<&PerformanceRow> {
        self.rows.last()
    }

    /// Number of ranked rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if nothing was ranked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for PerformanceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.rows.iter().map(|r| r.label.len()).max().unwrap_or(0).max(7);
        writeln!(f, "{:<width$}  {:>8}  {:>10}  {:>12}", "variant", "sharpe", "volatility", "max drawdown")?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<width$}  {:>8.3}  {:>10.4}  {:>12.4}",
                row.label, row.sharpe, row.volatility, row.max_drawdown
            )?;
        }
        for excluded in &self.excluded {
            writeln!(f, "{:<width$}  excluded: {}", excluded.label, excluded.error)?;
        }
        Ok(())
    }
}

/// Rank every column of `daily` against `reference`.
///
/// Each column gets its Sharpe ratio (mean excess over `reference`, matched
/// by date), annualized volatility and worst drawdown. Columns whose Sharpe
/// ratio is undefined are listed in [`PerformanceTable::excluded`].
///
/// # Errors
/// Returns `ModelError::Math` only if the table index is inconsistent.
pub fn calc_performance(
    daily: &ReturnTable,
    reference: &ReturnSeries,
    config: &StatsConfig,
) -> Result<PerformanceTable, ModelError> {
    let baseline = reference.aligned_to(daily.dates());
    let cumulative = cumulative_returns(daily)?;

    let mut table = PerformanceTable::default();
    for ((label, returns), levels) in daily
        .columns()
        .iter()
        .zip(daily.values().columns())
        .zip(cumulative.values().columns())
    {
        let stats = sharpe_ratio(label, returns, baseline.view(), config.periodicity, config.ddof)
            .and_then(|sharpe| {
                let volatility =
                    annualized_volatility(label, returns, config.periodicity, config.ddof)?;
                Ok((sharpe, volatility))
            });

        match stats {
            Ok((sharpe, volatility)) => table.rows.push(PerformanceRow {
                label: label.clone(),
                sharpe,
                volatility,
                max_drawdown: worst_drawdown(levels),
            }),
            Err(error) => {
                warn!(%label, %error, "excluding variant from ranking");
                table.excluded.push(ExcludedVariant { label: label.clone(), error });
            }
        }
    }

    table.rows.sort_by(|a, b| a.sharpe.total_cmp(&b.sharpe));
    Ok(table)
}
