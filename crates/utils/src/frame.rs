//! Conversions between polars frames and [`Panel`]s.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::TimeDelta;
use ndarray::Array2;
use polars::prelude::*;

use factorsim_primitives::{Date, GroupAssignment, Panel};

use crate::UtilsError;

/// Default name of the date column.
pub const DATE_COLUMN: &str = "date";

/// Default name of the ticker column in long frames.
pub const SYMBOL_COLUMN: &str = "symbol";

/// Default name of the group column in group frames.
pub const GROUP_COLUMN: &str = "group";

fn require<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, UtilsError> {
    df.column(name).map_err(|_| UtilsError::MissingColumn(name.to_string()))
}

/// Read a date column stored as a polars date, datetime or `%Y-%m-%d` string.
///
/// # Errors
/// Returns `UtilsError::InvalidDate` for nulls, unparsable strings or other dtypes.
pub fn column_dates(df: &DataFrame, name: &str) -> Result<Vec<Date>, UtilsError> {
    let column = require(df, name)?;
    let invalid = |value: String| UtilsError::InvalidDate { column: name.to_string(), value };

    match column.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let epoch = Date::from_ymd_opt(1970, 1, 1)
                .ok_or_else(|| invalid("unix epoch".to_string()))?;
            let days = column.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|d| {
                    d.and_then(|days| {
                        epoch.checked_add_signed(TimeDelta::days(i64::from(days)))
                    })
                    .ok_or_else(|| invalid(format!("{d:?}")))
                })
                .collect()
        }
        DataType::String => column
            .str()?
            .into_iter()
            .map(|s| {
                s.and_then(|s| Date::parse_from_str(s.trim(), "%Y-%m-%d").ok())
                    .ok_or_else(|| invalid(s.unwrap_or("null").to_string()))
            })
            .collect(),
        other => Err(invalid(format!("unsupported dtype {other}"))),
    }
}

/// Read a numeric column as `f64`, nulls becoming `NaN`.
///
/// # Errors
/// Returns `UtilsError` if the column is absent or not castable to float.
pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, UtilsError> {
    let column = require(df, name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Build a panel from a wide frame: one date column plus one column per ticker.
///
/// Rows are sorted by date first; repeated dates are rejected.
///
/// # Errors
/// Returns `UtilsError` on a missing date column, bad dates or repeated dates.
pub fn panel_from_wide(df: &DataFrame, date_col: &str) -> Result<Panel, UtilsError> {
    require(df, date_col)?;
    let sorted = df.sort([date_col], SortMultipleOptions::default().with_maintain_order(true))?;
    let dates = column_dates(&sorted, date_col)?;

    let names: Vec<String> = sorted
        .get_column_names()
        .into_iter()
        .filter(|c| c.as_str() != date_col)
        .map(|c| c.to_string())
        .collect();

    let mut values = Array2::from_elem((dates.len(), names.len()), f64::NAN);
    for (j, name) in names.iter().enumerate() {
        for (i, v) in column_values(&sorted, name)?.into_iter().enumerate() {
            values[[i, j]] = v;
        }
    }

    Ok(Panel::new(dates, names, values)?)
}

/// Build a panel from a long frame with one row per (date, symbol).
///
/// With `value_col` unset the frame must hold exactly one column besides the
/// date and symbol columns. Tickers are ordered alphabetically; cells with no
/// row are missing.
///
/// # Errors
/// Returns `UtilsError::DuplicateEntry` if a (date, symbol) pair repeats, or
/// `UtilsError` for missing columns, null symbols and bad dates.
pub fn panel_from_long(
    df: &DataFrame,
    date_col: &str,
    symbol_col: &str,
    value_col: Option<&str>,
) -> Result<Panel, UtilsError> {
    require(df, date_col)?;
    require(df, symbol_col)?;
    let value_col = match value_col {
        Some(name) => require(df, name)?.name().to_string(),
        None => {
            let rest: Vec<_> = df
                .get_column_names()
                .into_iter()
                .filter(|c| c.as_str() != date_col && c.as_str() != symbol_col)
                .collect();
            match rest.as_slice() {
                [only] => only.to_string(),
                _ => {
                    return Err(UtilsError::InvalidParameter(format!(
                        "expected one value column besides {date_col} and {symbol_col}, found {}",
                        rest.len()
                    )));
                }
            }
        }
    };

    let sorted = df
        .clone()
        .lazy()
        .select([
            col(date_col),
            col(symbol_col).cast(DataType::String),
            col(value_col.as_str()).cast(DataType::Float64),
        ])
        .sort([date_col], SortMultipleOptions::default().with_maintain_order(true))
        .collect()?;

    let row_dates = column_dates(&sorted, date_col)?;
    let symbols: Vec<&str> = sorted
        .column(symbol_col)?
        .str()?
        .into_iter()
        .map(|s| s.ok_or_else(|| UtilsError::InvalidParameter(format!("null in {symbol_col}"))))
        .collect::<Result<_, _>>()?;
    let row_values = column_values(&sorted, &value_col)?;

    let mut dates = row_dates.clone();
    dates.dedup();
    let tickers: Vec<String> =
        symbols.iter().copied().collect::<BTreeSet<_>>().into_iter().map(String::from).collect();

    let date_pos: HashMap<Date, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
    let ticker_pos: HashMap<&str, usize> =
        tickers.iter().enumerate().map(|(j, t)| (t.as_str(), j)).collect();

    let mut values = Array2::from_elem((dates.len(), tickers.len()), f64::NAN);
    let mut seen = Array2::from_elem((dates.len(), tickers.len()), false);
    for ((date, symbol), value) in row_dates.iter().zip(&symbols).zip(row_values) {
        let cell = [date_pos[date], ticker_pos[symbol]];
        if seen[cell] {
            return Err(UtilsError::DuplicateEntry {
                date: date.to_string(),
                symbol: (*symbol).to_string(),
            });
        }
        seen[cell] = true;
        values[cell] = value;
    }

    Ok(Panel::new(dates, tickers, values)?)
}

/// Wide frame with a polars date column and one float column per panel column.
///
/// Missing values are written as nulls.
///
/// # Errors
/// Returns `UtilsError::Polars` if the frame cannot be assembled.
pub fn panel_to_frame(panel: &Panel, date_col: &str) -> Result<DataFrame, UtilsError> {
    let mut columns = Vec::with_capacity(panel.n_columns() + 1);
    columns.push(Column::new(date_col.into(), panel.dates().to_vec()));
    for (name, values) in panel.columns().iter().zip(panel.values().columns()) {
        let cells: Vec<Option<f64>> = values.iter().map(|v| (!v.is_nan()).then_some(*v)).collect();
        columns.push(Column::new(name.as_str().into(), cells));
    }
    Ok(DataFrame::new(columns)?)
}

/// Long frame `label, date, column, value` from several labeled panels.
///
/// Used for per-variant group exposure, where every label has its own panel.
///
/// # Errors
/// Returns `UtilsError::Polars` if the frame cannot be assembled.
pub fn labeled_panels_to_long(
    panels: &BTreeMap<String, Panel>,
    label_col: &str,
    column_col: &str,
    value_col: &str,
) -> Result<DataFrame, UtilsError> {
    let mut labels = Vec::new();
    let mut dates = Vec::new();
    let mut names = Vec::new();
    let mut values = Vec::new();

    for (label, panel) in panels {
        for (i, date) in panel.dates().iter().enumerate() {
            for (j, name) in panel.columns().iter().enumerate() {
                let v = panel.values()[[i, j]];
                labels.push(label.as_str());
                dates.push(*date);
                names.push(name.as_str());
                values.push((!v.is_nan()).then_some(v));
            }
        }
    }

    Ok(DataFrame::new(vec![
        Column::new(label_col.into(), labels),
        Column::new(DATE_COLUMN.into(), dates),
        Column::new(column_col.into(), names),
        Column::new(value_col.into(), values),
    ])?)
}

/// Group assignment from a two-column frame.
///
/// Repeating a row is allowed; assigning one symbol to two groups is not.
/// Rows with a null symbol or group are skipped.
///
/// # Errors
/// Returns `UtilsError::ConflictingGroup` or `UtilsError::MissingColumn`.
pub fn groups_from_frame(
    df: &DataFrame,
    symbol_col: &str,
    group_col: &str,
) -> Result<GroupAssignment, UtilsError> {
    let symbols = require(df, symbol_col)?.cast(&DataType::String)?;
    let groups = require(df, group_col)?.cast(&DataType::String)?;

    let mut assignment = GroupAssignment::new();
    for (symbol, group) in symbols.str()?.into_iter().zip(groups.str()?) {
        let (Some(symbol), Some(group)) = (symbol, group) else {
            continue;
        };
        if let Some(first) = assignment.insert(symbol, group)
            && first != group
        {
            return Err(UtilsError::ConflictingGroup {
                symbol: symbol.to_string(),
                first,
                second: group.to_string(),
            });
        }
    }
    Ok(assignment)
}
