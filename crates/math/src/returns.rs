//! Price to return transforms.

use ndarray::{Array1, Array2, ArrayView1};

use factorsim_primitives::{PriceTable, ReturnSeries, ReturnTable};

use crate::MathError;

/// Simple daily returns, `price[t] / price[t - 1] - 1`, per column.
///
/// The first date has no predecessor and is defined as a return of 0 so the
/// output keeps the full date axis. A missing price on either side, or a zero
/// previous price, gives a missing return.
///
/// # Errors
/// Returns `MathError::Panel` only if the table index is inconsistent.
pub fn daily_returns(prices: &PriceTable) -> Result<ReturnTable, MathError> {
    let values = prices.values();
    let (rows, cols) = values.dim();
    let mut out = Array2::zeros((rows, cols));

    for i in 1..rows {
        for j in 0..cols {
            let prev = values[[i - 1, j]];
            let curr = values[[i, j]];
            out[[i, j]] = if prev.is_nan() || curr.is_nan() || prev == 0.0 {
                f64::NAN
            } else {
                curr / prev - 1.0
            };
        }
    }

    Ok(prices.with_values(out)?)
}

/// Compound returns, `cumprod(1 + r)`, independently per column.
///
/// Missing returns stay missing and leave the running product untouched.
///
/// # Errors
/// Returns `MathError::Panel` only if the table index is inconsistent.
pub fn cumulative_returns(returns: &ReturnTable) -> Result<ReturnTable, MathError> {
    let mut out = Array2::from_elem(returns.values().dim(), f64::NAN);
    for (j, column) in returns.values().columns().into_iter().enumerate() {
        out.column_mut(j).assign(&compound(column));
    }
    Ok(returns.with_values(out)?)
}

/// Compound a single return series, keeping its label.
///
/// # Errors
/// Returns `MathError::Panel` only if the series index is inconsistent.
pub fn cumulative_series(returns: &ReturnSeries) -> Result<ReturnSeries, MathError> {
    let compounded = compound(returns.values().view());
    Ok(ReturnSeries::new(returns.name(), returns.dates().to_vec(), compounded)?)
}

fn compound(returns: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut level = 1.0;
    returns
        .iter()
        .map(|&r| {
            if r.is_nan() {
                f64::NAN
            } else {
                level *= 1.0 + r;
                level
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;
    use factorsim_primitives::{Date, Panel};

    fn dates(n: u32) -> Vec<Date> {
        (0..n).map(|i| Date::from_ymd_opt(2024, 1, 2 + i).unwrap()).collect()
    }

    fn prices() -> Panel {
        Panel::from_columns(
            dates(3),
            vec![("AAA", vec![100.0, 110.0, 99.0]), ("BBB", vec![50.0, 50.0, 55.0])],
        )
        .unwrap()
    }

    #[test]
    fn daily_returns_first_row_is_zero() {
        let rets = daily_returns(&prices()).unwrap();

        let aaa = rets.column("AAA").unwrap();
        assert_relative_eq!(aaa[0], 0.0);
        assert_relative_eq!(aaa[1], 0.10, epsilon = 1e-12);
        assert_relative_eq!(aaa[2], -0.10, epsilon = 1e-12);

        let bbb = rets.column("BBB").unwrap();
        assert_relative_eq!(bbb[0], 0.0);
        assert_relative_eq!(bbb[1], 0.0);
        assert_relative_eq!(bbb[2], 0.10, epsilon = 1e-12);
    }

    #[test]
    fn cumulative_of_daily_returns() {
        let cum = cumulative_returns(&daily_returns(&prices()).unwrap()).unwrap();

        let aaa = cum.column("AAA").unwrap();
        assert_relative_eq!(aaa[0], 1.0);
        assert_relative_eq!(aaa[1], 1.10, epsilon = 1e-12);
        assert_relative_eq!(aaa[2], 0.99, epsilon = 1e-12);

        let bbb = cum.column("BBB").unwrap();
        assert_relative_eq!(bbb[2], 1.10, epsilon = 1e-12);
    }

    #[test]
    fn round_trip_reconstructs_relative_path() {
        let p = Panel::from_columns(
            dates(6),
            vec![
                ("X", vec![10.0, 10.5, 9.8, 11.2, 11.0, 12.4]),
                ("Y", vec![3.0, 2.7, 2.9, 3.3, 3.1, 3.05]),
            ],
        )
        .unwrap();

        let cum = cumulative_returns(&daily_returns(&p).unwrap()).unwrap();
        for (j, name) in p.columns().iter().enumerate() {
            let base = p.values()[[0, j]];
            for i in 0..p.n_dates() {
                assert_relative_eq!(
                    cum.column(name).unwrap()[i],
                    p.values()[[i, j]] / base,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn missing_prices_give_missing_returns() {
        let p = Panel::from_columns(dates(4), vec![("A", vec![10.0, f64::NAN, 12.0, 0.0])])
            .unwrap();
        let rets = daily_returns(&p).unwrap();
        let a = rets.column("A").unwrap();
        assert!(a[1].is_nan());
        assert!(a[2].is_nan());
        assert_relative_eq!(a[3], -1.0);
    }

    #[test]
    fn compound_skips_missing() {
        let out = compound(array![0.1, f64::NAN, 0.1].view());
        assert_relative_eq!(out[0], 1.1);
        assert!(out[1].is_nan());
        assert_relative_eq!(out[2], 1.21, epsilon = 1e-12);
    }

    #[test]
    fn cumulative_series_keeps_name() {
        let s = ReturnSeries::new("roll-2", dates(2), array![0.5, -0.5]).unwrap();
        let cum = cumulative_series(&s).unwrap();
        assert_eq!(cum.name(), "roll-2");
        assert_relative_eq!(cum.values()[1], 0.75);
    }
}
