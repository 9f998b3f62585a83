//! Risk and return statistics.

use ndarray::{Array1, Array2, ArrayView1};

use factorsim_primitives::{Periodicity, ReturnSeries, ReturnTable};

use crate::MathError;

/// Standard deviations at or below this are treated as zero.
const ZERO_VOLATILITY: f64 = 1e-12;

/// Baseline subtracted from returns before averaging.
#[derive(Debug, Clone, Copy)]
pub enum Reference<'a> {
    /// Constant rate per period.
    Scalar(f64),
    /// Per-date rate, matched to the returns by date.
    Series(&'a ReturnSeries),
}

impl Reference<'_> {
    fn aligned(&self, returns: &ReturnTable) -> Array1<f64> {
        match self {
            Self::Scalar(rate) => Array1::from_elem(returns.n_dates(), *rate),
            Self::Series(series) => series.aligned_to(returns.dates()),
        }
    }
}

/// Mean of the non-missing values, `None` if there are none.
#[must_use]
pub fn mean(values: ArrayView1<'_, f64>) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Standard deviation of the non-missing values with `ddof` delta degrees of freedom.
///
/// Returns `None` when there are not more than `ddof` observations.
#[must_use]
pub fn std_dev(values: ArrayView1<'_, f64>, ddof: usize) -> Option<f64> {
    let n = count(values);
    if n <= ddof {
        return None;
    }
    let mu = mean(values)?;
    let ss: f64 = values.iter().filter(|v| !v.is_nan()).map(|v| (v - mu).powi(2)).sum();
    Some((ss / (n - ddof) as f64).sqrt())
}

fn count(values: ArrayView1<'_, f64>) -> usize {
    values.iter().filter(|v| !v.is_nan()).count()
}

/// Annualized Sharpe ratio of one return column against a per-date reference.
///
/// The mean is taken over `returns - reference` on dates where both are
/// present; the volatility is that of `returns` alone.
///
/// # Errors
/// * `MathError::InsufficientData` - not more than `ddof` returns, or no date
///   with both a return and a reference value
/// * `MathError::ZeroVolatility` - the returns do not vary
pub fn sharpe_ratio(
    column: &str,
    returns: ArrayView1<'_, f64>,
    reference: ArrayView1<'_, f64>,
    periodicity: Periodicity,
    ddof: usize,
) -> Result<f64, MathError> {
    let insufficient = |actual| MathError::InsufficientData {
        column: column.to_string(),
        required: ddof + 1,
        actual,
    };

    let volatility = std_dev(returns, ddof).ok_or_else(|| insufficient(count(returns)))?;
    if volatility <= ZERO_VOLATILITY {
        return Err(MathError::ZeroVolatility { column: column.to_string() });
    }

    let excess: Array1<f64> = returns.iter().zip(reference.iter()).map(|(r, b)| r - b).collect();
    let excess_mean = mean(excess.view()).ok_or_else(|| insufficient(0))?;

    Ok(excess_mean * periodicity.annualization() / volatility)
}

/// Annualized Sharpe ratio of every column of `returns`.
///
/// # Errors
/// Fails on the first degenerate column, see [`sharpe_ratio`].
pub fn sharpe(
    returns: &ReturnTable,
    reference: Reference<'_>,
    periodicity: Periodicity,
    ddof: usize,
) -> Result<Vec<(String, f64)>, MathError> {
    let baseline = reference.aligned(returns);
    returns
        .columns()
        .iter()
        .zip(returns.values().columns())
        .map(|(name, column)| {
            sharpe_ratio(name, column, baseline.view(), periodicity, ddof)
                .map(|ratio| (name.clone(), ratio))
        })
        .collect()
}

/// Standard deviation scaled to one year.
///
/// # Errors
/// Returns `MathError::InsufficientData` when there are not more than `ddof` returns.
pub fn annualized_volatility(
    column: &str,
    returns: ArrayView1<'_, f64>,
    periodicity: Periodicity,
    ddof: usize,
) -> Result<f64, MathError> {
    std_dev(returns, ddof).map(|sd| sd * periodicity.annualization()).ok_or_else(|| {
        MathError::InsufficientData {
            column: column.to_string(),
            required: ddof + 1,
            actual: count(returns),
        }
    })
}

/// Drawdown from the running peak, `cumulative / running_max - 1`, per column.
///
/// The running maximum only looks backwards. Missing levels stay missing.
///
/// # Errors
/// Returns `MathError::Panel` only if the table index is inconsistent.
pub fn max_drawdown(cumulative: &ReturnTable) -> Result<ReturnTable, MathError> {
    let mut out = Array2::from_elem(cumulative.values().dim(), f64::NAN);
    for (j, column) in cumulative.values().columns().into_iter().enumerate() {
        out.column_mut(j).assign(&drawdown(column));
    }
    Ok(cumulative.with_values(out)?)
}

/// Drawdown path of one cumulative series.
///
/// # Errors
/// Returns `MathError::Panel` only if the series index is inconsistent.
pub fn drawdown_series(cumulative: &ReturnSeries) -> Result<ReturnSeries, MathError> {
    let path = drawdown(cumulative.values().view());
    Ok(ReturnSeries::new(cumulative.name(), cumulative.dates().to_vec(), path)?)
}

/// Deepest drawdown of a cumulative path, 0 when it never falls below its peak.
#[must_use]
pub fn worst_drawdown(cumulative: ArrayView1<'_, f64>) -> f64 {
    drawdown(cumulative).iter().filter(|v| !v.is_nan()).fold(0.0, |acc, &v| acc.min(v))
}

/// A level at or below zero means the capital is gone: drawdown -1.
fn drawdown(cumulative: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut peak = f64::NEG_INFINITY;
    cumulative
        .iter()
        .map(|&level| {
            if level.is_nan() {
                return f64::NAN;
            }
            peak = peak.max(level);
            if level <= 0.0 { -1.0 } else { level / peak - 1.0 }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    use super::*;
    use factorsim_primitives::{Date, Panel};

    fn dates(n: u32) -> Vec<Date> {
        (0..n).map(|i| Date::from_ymd_opt(2024, 4, 1 + i).unwrap()).collect()
    }

    #[test]
    fn mean_and_std_skip_missing() {
        let v = array![1.0, f64::NAN, 3.0];
        assert_relative_eq!(mean(v.view()).unwrap(), 2.0);
        assert_relative_eq!(std_dev(v.view(), 1).unwrap(), 2.0_f64.sqrt());
        assert_relative_eq!(std_dev(v.view(), 0).unwrap(), 1.0);
        assert!(std_dev(array![1.0].view(), 1).is_none());
        assert!(mean(array![f64::NAN].view()).is_none());
    }

    #[test]
    fn sharpe_ratio_matches_hand_computation() {
        let r = array![0.01, 0.02, -0.01, 0.03];
        let zero = Array1::zeros(4);
        let mu = 0.0125;
        let sd = std_dev(r.view(), 1).unwrap();
        let expected = mu / sd * 252_f64.sqrt();

        let got = sharpe_ratio("x", r.view(), zero.view(), Periodicity::Daily, 1).unwrap();
        assert_relative_eq!(got, expected, epsilon = 1e-12);
    }

    #[test]
    fn sharpe_ratio_monthly_scaling() {
        let r = array![0.01, 0.02, -0.01, 0.03];
        let zero = Array1::zeros(4);
        let daily = sharpe_ratio("x", r.view(), zero.view(), Periodicity::Daily, 1).unwrap();
        let monthly = sharpe_ratio("x", r.view(), zero.view(), Periodicity::Monthly, 1).unwrap();
        assert_relative_eq!(daily / monthly, (252.0_f64 / 12.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn sharpe_of_constant_zero_is_zero_volatility() {
        let r = Array1::zeros(10);
        let err = sharpe_ratio("flat", r.view(), r.view(), Periodicity::Daily, 1).unwrap_err();
        assert!(matches!(err, MathError::ZeroVolatility { ref column } if column == "flat"));
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 2)]
    fn sharpe_needs_more_than_ddof(#[case] n: usize, #[case] ddof: usize) {
        let r = Array1::from_elem(n, 0.01);
        let err = sharpe_ratio("short", r.view(), r.view(), Periodicity::Daily, ddof).unwrap_err();
        assert!(matches!(err, MathError::InsufficientData { actual, .. } if actual == n));
    }

    #[test]
    fn sharpe_against_reference_series() {
        let table = Panel::from_columns(
            dates(4),
            vec![("s", vec![0.02, 0.01, 0.03, 0.00]), ("b", vec![0.01, 0.01, 0.01, 0.01])],
        )
        .unwrap();
        let baseline = table.series("b").unwrap();

        // The baseline has zero volatility, so only the strategy column is ranked.
        let only_s = table.select_columns(&["s".to_string()]).unwrap();
        let ratios =
            sharpe(&only_s, Reference::Series(&baseline), Periodicity::Daily, 1).unwrap();
        let s = array![0.02, 0.01, 0.03, 0.00];
        let expected = 0.005 / std_dev(s.view(), 1).unwrap() * 252_f64.sqrt();
        assert_eq!(ratios[0].0, "s");
        assert_relative_eq!(ratios[0].1, expected, epsilon = 1e-12);

        let err = sharpe(&table, Reference::Series(&baseline), Periodicity::Daily, 1);
        assert!(matches!(err, Err(MathError::ZeroVolatility { .. })));
    }

    #[test]
    fn scalar_reference_shifts_mean() {
        let table =
            Panel::from_columns(dates(3), vec![("s", vec![0.02, 0.00, 0.01])]).unwrap();
        let base = sharpe(&table, Reference::Scalar(0.0), Periodicity::Daily, 1).unwrap();
        let shifted = sharpe(&table, Reference::Scalar(0.01), Periodicity::Daily, 1).unwrap();
        assert!(base[0].1 > 0.0);
        assert_relative_eq!(shifted[0].1, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn annualized_volatility_scales_by_sqrt_period() {
        let r = array![0.01, -0.01, 0.02, -0.02];
        let vol = annualized_volatility("x", r.view(), Periodicity::Daily, 1).unwrap();
        assert_relative_eq!(vol, std_dev(r.view(), 1).unwrap() * 252_f64.sqrt());
    }

    #[test]
    fn drawdown_is_never_positive() {
        let cum = Panel::from_columns(
            dates(6),
            vec![("x", vec![1.0, 1.2, 0.9, f64::NAN, 1.3, 1.04])],
        )
        .unwrap();
        let dd = max_drawdown(&cum).unwrap();
        let x = dd.column("x").unwrap();

        assert_relative_eq!(x[0], 0.0);
        assert_relative_eq!(x[1], 0.0);
        assert_relative_eq!(x[2], -0.25, epsilon = 1e-12);
        assert!(x[3].is_nan());
        assert_relative_eq!(x[4], 0.0);
        assert_relative_eq!(x[5], -0.2, epsilon = 1e-12);
        assert!(x.iter().filter(|v| !v.is_nan()).all(|&v| v <= 0.0));
    }

    #[test]
    fn worst_drawdown_picks_minimum() {
        assert_relative_eq!(
            worst_drawdown(array![1.0, 1.2, 0.9, 1.3, 1.04].view()),
            -0.25,
            epsilon = 1e-12
        );
        assert_relative_eq!(worst_drawdown(array![1.0, 1.1, 1.2].view()), 0.0);
    }

    #[test]
    fn wiped_out_levels_floor_at_minus_one() {
        let cum =
            Panel::from_columns(dates(4), vec![("x", vec![-0.5, -1.0, 1.0, -0.2])]).unwrap();
        let dd = max_drawdown(&cum).unwrap();
        let x = dd.column("x").unwrap();

        assert_relative_eq!(x[0], -1.0);
        assert_relative_eq!(x[1], -1.0);
        assert_relative_eq!(x[2], 0.0);
        assert_relative_eq!(x[3], -1.0);
        assert_relative_eq!(worst_drawdown(array![1.0, 0.5, -0.1].view()), -1.0);
    }

    #[test]
    fn drawdown_series_keeps_index() {
        let cum = ReturnSeries::new("roll-5", dates(3), array![1.0, 0.8, 0.9]).unwrap();
        let dd = drawdown_series(&cum).unwrap();
        assert_eq!(dd.name(), "roll-5");
        assert_eq!(dd.dates(), cum.dates());
        assert_relative_eq!(dd.values()[1], -0.2, epsilon = 1e-12);
    }
}
