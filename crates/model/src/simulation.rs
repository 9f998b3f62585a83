//! Strategy return simulation with a one-session execution lag.

use ndarray::{Array1, ArrayView1, Zip};
use tracing::debug;

use factorsim_math::{cumulative_series, shift_business_days};
use factorsim_primitives::{Allocation, Date, PortfolioWeights, ReturnSeries, ReturnTable};

use crate::ModelError;

/// Label given to simulated series before a variant name is attached.
pub const STRATEGY_LABEL: &str = "strategy";

/// Daily and compounded returns of one weighted strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedReturns {
    /// Growth of one unit, indexed by realization date.
    pub cumulative: ReturnSeries,
    /// Net daily strategy return, indexed by realization date.
    pub daily: ReturnSeries,
}

impl SimulatedReturns {
    /// Relabel both series.
    #[must_use]
    pub fn renamed(self, name: &str) -> Self {
        Self { cumulative: self.cumulative.renamed(name), daily: self.daily.renamed(name) }
    }
}

/// Realize `weights` against `returns`.
///
/// Weights decided on date `t` are held from the next business day, so row
/// `t` of `weights` earns the returns dated `t + 1`. The daily return is the
/// sum of weight times realized return over tickers with a return that day.
/// With `trade_cost`, `rate * sum |w_t - w_{t-1}|` is subtracted, the first
/// date paying for its full initial weight.
///
/// # Errors
/// * `ModelError::InvalidConfig` - negative or non-finite `trade_cost`
/// * `ModelError::MissingAlignment` - a weighted ticker has no return column
/// * `ModelError::ShiftCollision` - two decision dates land on one session
pub fn calc_returns(
    weights: &PortfolioWeights,
    returns: &ReturnTable,
    trade_cost: Option<f64>,
) -> Result<SimulatedReturns, ModelError> {
    simulate(weights, returns, trade_cost, &[])
}

/// Realize an allocation, as [`calc_returns`] does for its weights.
///
/// Dates the scheme held flat carry no position but are not traded: the
/// turnover charge skips them and the next active date is compared with the
/// last active book.
///
/// # Errors
/// Same conditions as [`calc_returns`].
pub fn calc_allocation_returns(
    allocation: &Allocation,
    returns: &ReturnTable,
    trade_cost: Option<f64>,
) -> Result<SimulatedReturns, ModelError> {
    simulate(&allocation.weights, returns, trade_cost, &allocation.skipped_dates)
}

fn simulate(
    weights: &PortfolioWeights,
    returns: &ReturnTable,
    trade_cost: Option<f64>,
    skipped: &[Date],
) -> Result<SimulatedReturns, ModelError> {
    if let Some(rate) = trade_cost
        && !(rate.is_finite() && rate >= 0.0)
    {
        return Err(ModelError::InvalidConfig(format!(
            "trade cost must be a non-negative number, got {rate}"
        )));
    }

    let missing = returns.missing_columns(weights.columns());
    if !missing.is_empty() {
        return Err(ModelError::MissingAlignment { table: "returns".to_string(), tickers: missing });
    }

    let held_on = shift_business_days(weights.dates(), 1)?;
    if let Some(pair) = held_on.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(ModelError::ShiftCollision(pair[1]));
    }

    let realized = returns.select_columns(weights.columns())?.reindex_dates(&held_on)?;

    let mut daily: Array1<f64> = weights
        .values()
        .rows()
        .into_iter()
        .zip(realized.values().rows())
        .map(|(w, r)| portfolio_return(w, r))
        .collect();

    if let Some(rate) = trade_cost.filter(|&rate| rate > 0.0) {
        let turnover = turnover(weights, skipped);
        daily.zip_mut_with(&turnover, |r, t| *r -= rate * t);
        debug!(rate, total_turnover = turnover.sum(), "applied trade costs");
    }

    let daily = ReturnSeries::new(STRATEGY_LABEL, held_on, daily)?;
    let cumulative = cumulative_series(&daily)?;
    Ok(SimulatedReturns { cumulative, daily })
}

fn portfolio_return(weights: ArrayView1<'_, f64>, returns: ArrayView1<'_, f64>) -> f64 {
    Zip::from(weights)
        .and(returns)
        .fold(0.0, |acc, &w, &r| if r.is_nan() { acc } else { acc + w * r })
}

/// Sum of absolute weight changes per date, starting from a flat book.
///
/// Rows dated in `skipped` trade nothing.
fn turnover(weights: &PortfolioWeights, skipped: &[Date]) -> Array1<f64> {
    let values = weights.values();
    let mut previous = Array1::<f64>::zeros(values.ncols());
    values
        .rows()
        .into_iter()
        .zip(weights.dates())
        .map(|(row, date)| {
            if skipped.contains(date) {
                return 0.0;
            }
            let traded = Zip::from(row)
                .and(&previous)
                .fold(0.0_f64, |acc, &w: &f64, &p: &f64| acc + (w - p).abs());
            previous.assign(&row);
            traded
        })
        .collect()
}
