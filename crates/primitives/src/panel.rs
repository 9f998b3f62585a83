//! Dense date x column tables.

use std::collections::{BTreeSet, HashSet};

use ndarray::{Array2, ArrayView1, Axis};

use crate::{Date, PanelError, ReturnSeries};

/// Close prices, date x ticker.
pub type PriceTable = Panel;

/// Cross-sectional signal, date x ticker.
pub type FactorMatrix = Panel;

/// Target portfolio weights, date x ticker.
pub type PortfolioWeights = Panel;

/// Aggregated weight per group, date x group.
pub type GroupWeights = Panel;

/// Wide table of return series, date x variant or date x ticker.
pub type ReturnTable = Panel;

/// A date-indexed table of `f64` values.
///
/// Rows follow a strictly increasing date axis and columns carry unique labels.
/// Missing observations are stored as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    dates: Vec<Date>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl Panel {
    /// Create a panel, validating the index against the value matrix.
    ///
    /// # Errors
    /// Returns `PanelError` if the shape disagrees with the index, the dates are
    /// not strictly increasing, or a column label repeats.
    pub fn new(
        dates: Vec<Date>,
        columns: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self, PanelError> {
        let (rows, cols) = values.dim();
        if rows != dates.len() || cols != columns.len() {
            return Err(PanelError::ShapeMismatch {
                dates: dates.len(),
                columns: columns.len(),
                rows,
                cols,
            });
        }

        validate_dates(&dates)?;

        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(PanelError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self { dates, columns, values })
    }

    /// Create a panel with every cell set to `value`.
    ///
    /// # Errors
    /// Same conditions as [`Panel::new`].
    pub fn filled(dates: Vec<Date>, columns: Vec<String>, value: f64) -> Result<Self, PanelError> {
        let values = Array2::from_elem((dates.len(), columns.len()), value);
        Self::new(dates, columns, values)
    }

    /// Build a panel from named columns sharing one date axis.
    ///
    /// # Errors
    /// Returns `PanelError::ShapeMismatch` if a column's length differs from the
    /// date axis, plus the conditions of [`Panel::new`].
    pub fn from_columns<S: Into<String>>(
        dates: Vec<Date>,
        columns: Vec<(S, Vec<f64>)>,
    ) -> Result<Self, PanelError> {
        let n_dates = dates.len();
        let n_cols = columns.len();
        let mut names = Vec::with_capacity(n_cols);
        let mut values = Array2::from_elem((n_dates, n_cols), f64::NAN);

        for (j, (name, data)) in columns.into_iter().enumerate() {
            if data.len() != n_dates {
                return Err(PanelError::ShapeMismatch {
                    dates: n_dates,
                    columns: n_cols,
                    rows: data.len(),
                    cols: n_cols,
                });
            }
            for (i, v) in data.into_iter().enumerate() {
                values[[i, j]] = v;
            }
            names.push(name.into());
        }

        Self::new(dates, names, values)
    }

    /// Column-concatenate named series on the union of their date axes.
    ///
    /// Dates a series does not cover are left missing.
    ///
    /// # Errors
    /// Returns `PanelError::DuplicateColumn` if two series share a name.
    pub fn from_series(series: &[ReturnSeries]) -> Result<Self, PanelError> {
        let dates: Vec<Date> = series
            .iter()
            .flat_map(|s| s.dates().iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut values = Array2::from_elem((dates.len(), series.len()), f64::NAN);
        for (j, s) in series.iter().enumerate() {
            for (date, value) in s.iter() {
                // Every series date is in the union by construction.
                if let Ok(i) = dates.binary_search(&date) {
                    values[[i, j]] = value;
                }
            }
        }

        let columns = series.iter().map(|s| s.name().to_string()).collect();
        Self::new(dates, columns, values)
    }

    /// Date axis.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column labels.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value matrix (n_dates x n_columns).
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates.
    #[must_use]
    pub const fn n_dates(&self) -> usize {
        self.dates.len()
    }

    /// Number of columns.
    #[must_use]
    pub const fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Check if the panel holds no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }

    /// Position of a column label.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of a date on the axis.
    #[must_use]
    pub fn date_index(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// View of one column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|j| self.values.column(j))
    }

    /// View of one row.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// Value at a date and column, `None` if either label is absent.
    #[must_use]
    pub fn get(&self, date: Date, column: &str) -> Option<f64> {
        let i = self.date_index(date)?;
        let j = self.column_index(column)?;
        Some(self.values[[i, j]])
    }

    /// Extract one column as a named series.
    #[must_use]
    pub fn series(&self, name: &str) -> Option<ReturnSeries> {
        let column = self.column(name)?;
        ReturnSeries::new(name, self.dates.clone(), column.to_owned()).ok()
    }

    /// Same index, new values.
    ///
    /// # Errors
    /// Returns `PanelError::ShapeMismatch` if the shape differs.
    pub fn with_values(&self, values: Array2<f64>) -> Result<Self, PanelError> {
        Self::new(self.dates.clone(), self.columns.clone(), values)
    }

    /// Replace the date axis, keeping columns and values.
    ///
    /// # Errors
    /// Returns `PanelError` if the new axis has the wrong length or is unordered.
    pub fn with_dates(self, dates: Vec<Date>) -> Result<Self, PanelError> {
        Self::new(dates, self.columns, self.values)
    }

    /// Apply `f` to every cell.
    #[must_use]
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            dates: self.dates.clone(),
            columns: self.columns.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Labels from `wanted` that are not columns of this panel.
    #[must_use]
    pub fn missing_columns(&self, wanted: &[String]) -> Vec<String> {
        let present: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        wanted.iter().filter(|c| !present.contains(c.as_str())).cloned().collect()
    }

    /// Restrict and reorder columns.
    ///
    /// # Errors
    /// Returns `PanelError::UnknownColumn` for the first absent label.
    pub fn select_columns(&self, columns: &[String]) -> Result<Self, PanelError> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c).ok_or_else(|| PanelError::UnknownColumn(c.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let values = self.values.select(Axis(1), &indices);
        Self::new(self.dates.clone(), columns.to_vec(), values)
    }

    /// Conform the panel to a new date axis; dates not present become missing rows.
    ///
    /// # Errors
    /// Returns `PanelError::UnorderedDates` if `dates` is not strictly increasing.
    pub fn reindex_dates(&self, dates: &[Date]) -> Result<Self, PanelError> {
        let mut values = Array2::from_elem((dates.len(), self.columns.len()), f64::NAN);
        for (i, date) in dates.iter().enumerate() {
            if let Some(src) = self.date_index(*date) {
                values.row_mut(i).assign(&self.values.row(src));
            }
        }
        Self::new(dates.to_vec(), self.columns.clone(), values)
    }

    /// Decompose into index and values.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Date>, Vec<String>, Array2<f64>) {
        (self.dates, self.columns, self.values)
    }
}

pub(crate) fn validate_dates(dates: &[Date]) -> Result<(), PanelError> {
    for pair in dates.windows(2) {
        if pair[1] <= pair[0] {
            return Err(PanelError::UnorderedDates { previous: pair[0], next: pair[1] });
        }
    }
    Ok(())
}
