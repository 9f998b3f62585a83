//! Business-day calendar (Monday to Friday, no holidays).

use chrono::{Datelike, Days, Weekday};

use factorsim_primitives::Date;

use crate::MathError;

/// True for Monday through Friday.
#[must_use]
pub fn is_business_day(date: Date) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first business day strictly after `date`.
///
/// # Errors
/// Returns `MathError::DateOverflow` at the end of the representable range.
pub fn next_business_day(date: Date) -> Result<Date, MathError> {
    let mut next = date;
    loop {
        next = next.checked_add_days(Days::new(1)).ok_or(MathError::DateOverflow(date))?;
        if is_business_day(next) {
            return Ok(next);
        }
    }
}

/// Shift every date forward by `periods` business days.
///
/// A weekend date counts its first step as the following Monday.
///
/// # Errors
/// Returns `MathError::DateOverflow` at the end of the representable range.
pub fn shift_business_days(dates: &[Date], periods: usize) -> Result<Vec<Date>, MathError> {
    dates
        .iter()
        .map(|&date| (0..periods).try_fold(date, |d, _| next_business_day(d)))
        .collect()
}

/// Every business day in `[start, end]`.
#[must_use]
pub fn business_days(start: Date, end: Date) -> Vec<Date> {
    start.iter_days().take_while(|d| *d <= end).filter(|d| is_business_day(*d)).collect()
}
