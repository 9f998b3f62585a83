//! CSV reading and writing.

use std::{fs::File, path::Path};

use polars::prelude::*;
use tracing::debug;

use factorsim_primitives::{GroupAssignment, Panel};

use crate::{
    DATE_COLUMN, GROUP_COLUMN, SYMBOL_COLUMN, UtilsError, groups_from_frame, panel_from_long,
    panel_from_wide, panel_to_frame,
};

/// Shape of a table on disk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelLayout {
    /// `date` plus one column per ticker.
    #[default]
    Wide,
    /// `date`, `symbol` and one value column, optionally named.
    Long {
        /// Value column; the only remaining column when unset.
        value: Option<String>,
    },
}

impl PanelLayout {
    /// Long when the frame has a `symbol` column, wide otherwise.
    #[must_use]
    pub fn detect(df: &DataFrame) -> Self {
        if df.get_column_names().iter().any(|c| c.as_str() == SYMBOL_COLUMN) {
            Self::Long { value: None }
        } else {
            Self::Wide
        }
    }
}

/// Read a CSV file with a header row, parsing ISO dates.
///
/// # Errors
/// Returns `UtilsError::Polars` if the file cannot be read or parsed.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame, UtilsError> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|options| options.with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "read csv");
    Ok(df)
}

/// Write a frame as CSV with a header row.
///
/// # Errors
/// Returns `UtilsError` if the file cannot be created or written.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<(), UtilsError> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    debug!(path = %path.display(), rows = df.height(), "wrote csv");
    Ok(())
}

/// Read a panel from CSV, detecting the layout when `layout` is `None`.
///
/// # Errors
/// Returns `UtilsError` if the file cannot be read or does not form a panel.
pub fn read_panel_csv(
    path: impl AsRef<Path>,
    layout: Option<PanelLayout>,
) -> Result<Panel, UtilsError> {
    let df = read_csv(path)?;
    match layout.unwrap_or_else(|| PanelLayout::detect(&df)) {
        PanelLayout::Wide => panel_from_wide(&df, DATE_COLUMN),
        PanelLayout::Long { value } => {
            panel_from_long(&df, DATE_COLUMN, SYMBOL_COLUMN, value.as_deref())
        }
    }
}

/// Write a panel as a wide CSV with a `date` column.
///
/// # Errors
/// Returns `UtilsError` if the file cannot be written.
pub fn write_panel_csv(panel: &Panel, path: impl AsRef<Path>) -> Result<(), UtilsError> {
    let mut df = panel_to_frame(panel, DATE_COLUMN)?;
    write_csv(&mut df, path)
}

/// Read a `symbol,group` CSV.
///
/// # Errors
/// Returns `UtilsError` if the file cannot be read or a symbol has two groups.
pub fn read_groups_csv(path: impl AsRef<Path>) -> Result<GroupAssignment, UtilsError> {
    groups_from_frame(&read_csv(path)?, SYMBOL_COLUMN, GROUP_COLUMN)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use approx::assert_relative_eq;

    use super::*;
    use factorsim_primitives::Date;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn reads_wide_prices() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "prices.csv", "date,AAA,BBB\n2024-01-02,100,50\n2024-01-03,110,\n");

        let panel = read_panel_csv(&path, None).unwrap();
        assert_eq!(panel.dates(), &[d(2), d(3)]);
        assert_relative_eq!(panel.get(d(3), "AAA").unwrap(), 110.0);
        assert!(panel.get(d(3), "BBB").unwrap().is_nan());
    }

    #[test]
    fn detects_long_factor() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "factor.csv",
            "date,symbol,value\n2024-01-02,AAA,1.5\n2024-01-02,BBB,0.5\n2024-01-03,AAA,2.0\n",
        );

        let panel = read_panel_csv(&path, None).unwrap();
        assert_eq!(panel.columns(), &["AAA".to_string(), "BBB".to_string()]);
        assert!(panel.get(d(3), "BBB").unwrap().is_nan());
    }

    #[test]
    fn panel_survives_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let panel = Panel::from_columns(
            vec![d(2), d(3), d(4)],
            vec![("roll-2", vec![1.0, 1.01, f64::NAN]), ("roll-5", vec![1.0, 0.99, 1.02])],
        )
        .unwrap();

        let path = dir.path().join("cumulative.csv");
        write_panel_csv(&panel, &path).unwrap();
        let back = read_panel_csv(&path, Some(PanelLayout::Wide)).unwrap();

        assert_eq!(back.dates(), panel.dates());
        assert_eq!(back.columns(), panel.columns());
        assert_relative_eq!(back.get(d(3), "roll-5").unwrap(), 0.99);
        assert!(back.get(d(4), "roll-2").unwrap().is_nan());
    }

    #[test]
    fn reads_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "groups.csv", "symbol,group\nAAA,Tech\nBBB,Energy\n");
        let groups = read_groups_csv(&path).unwrap();
        assert_eq!(groups.groups(), vec!["Energy", "Tech"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_csv(dir.path().join("absent.csv")).is_err());
    }
}
