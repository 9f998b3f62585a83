//! Signal construction and smoothing.

use ndarray::{Array2, s};
use tracing::warn;

use factorsim_primitives::{Date, FactorMatrix, Panel};

use crate::MathError;

/// Uniform signal of 1 on every date and ticker.
///
/// Carries no information and serves as the zero-skill reference strategy.
///
/// # Errors
/// Returns `MathError::Panel` if the dates are unordered or tickers repeat.
pub fn equal_weight(dates: &[Date], tickers: &[String]) -> Result<FactorMatrix, MathError> {
    Ok(Panel::filled(dates.to_vec(), tickers.to_vec(), 1.0)?)
}

/// Trailing sum of a factor over `window` dates, per ticker.
///
/// Each cell becomes the sum of the non-missing values among itself and up to
/// `window - 1` preceding dates. Early dates use whatever history exists, and a
/// cell stays missing only when its whole window is missing. `None` returns the
/// factor unchanged.
///
/// # Errors
/// Returns `MathError::InvalidWindow` for a zero window.
pub fn roll(factor: &FactorMatrix, window: Option<usize>) -> Result<FactorMatrix, MathError> {
    let Some(window) = window else {
        return Ok(factor.clone());
    };
    if window == 0 {
        return Err(MathError::InvalidWindow(window));
    }
    if window > factor.n_dates() {
        warn!(
            window,
            n_dates = factor.n_dates(),
            "smoothing window exceeds available history, summing all prior observations"
        );
    }

    let values = factor.values();
    let (rows, cols) = values.dim();
    let mut out = Array2::from_elem((rows, cols), f64::NAN);

    for j in 0..cols {
        for i in 0..rows {
            let start = (i + 1).saturating_sub(window);
            let window_values = values.slice(s![start..=i, j]);
            let mut observed = window_values.iter().filter(|v| !v.is_nan());
            if let Some(first) = observed.next() {
                out[[i, j]] = observed.fold(*first, |acc, v| acc + v);
            }
        }
    }

    Ok(factor.with_values(out)?)
}
