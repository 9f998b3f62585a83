//! Named return series.

use ndarray::Array1;

use crate::{Date, PanelError, panel::validate_dates};

/// A date-indexed scalar series labeled by variant name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    name: String,
    dates: Vec<Date>,
    values: Array1<f64>,
}

impl ReturnSeries {
    /// Create a new series.
    ///
    /// # Errors
    /// Returns `PanelError` if lengths differ or dates are not strictly increasing.
    pub fn new(
        name: impl Into<String>,
        dates: Vec<Date>,
        values: Array1<f64>,
    ) -> Result<Self, PanelError> {
        if dates.len() != values.len() {
            return Err(PanelError::ShapeMismatch {
                dates: dates.len(),
                columns: 1,
                rows: values.len(),
                cols: 1,
            });
        }
        validate_dates(&dates)?;
        Ok(Self { name: name.into(), dates, values })
    }

    /// Series label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Date axis.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Values aligned with [`ReturnSeries::dates`].
    #[must_use]
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Number of observations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Value on a date.
    #[must_use]
    pub fn get(&self, date: Date) -> Option<f64> {
        self.dates.binary_search(&date).ok().map(|i| self.values[i])
    }

    /// Iterate over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Same data under a different label.
    #[must_use]
    pub fn renamed(self, name: impl Into<String>) -> Self {
        Self { name: name.into(), ..self }
    }

    /// Values conformed to another date axis, `NaN` where this series has no entry.
    #[must_use]
    pub fn aligned_to(&self, dates: &[Date]) -> Array1<f64> {
        dates.iter().map(|d| self.get(*d).unwrap_or(f64::NAN)).collect()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn series_get() {
        let s = ReturnSeries::new("roll-5", vec![d(2), d(3)], array![0.01, -0.02]).unwrap();
        assert_eq!(s.get(d(3)), Some(-0.02));
        assert_eq!(s.get(d(4)), None);
        assert_eq!(s.name(), "roll-5");
    }

    #[test]
    fn series_rejects_length_mismatch() {
        let err = ReturnSeries::new("x", vec![d(2)], array![0.1, 0.2]);
        assert!(matches!(err, Err(PanelError::ShapeMismatch { .. })));
    }

    #[test]
    fn aligned_to_marks_gaps() {
        let s = ReturnSeries::new("x", vec![d(2), d(4)], array![1.0, 2.0]).unwrap();
        let aligned = s.aligned_to(&[d(2), d(3), d(4)]);
        assert_eq!(aligned[0], 1.0);
        assert!(aligned[1].is_nan());
        assert_eq!(aligned[2], 2.0);
    }

    #[test]
    fn renamed_keeps_values() {
        let s = ReturnSeries::new("a", vec![d(2)], array![0.5]).unwrap().renamed("b");
        assert_eq!(s.name(), "b");
        assert_eq!(s.get(d(2)), Some(0.5));
    }
}
