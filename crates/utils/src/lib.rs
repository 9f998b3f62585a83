#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorsim/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod frame;
pub use frame::{
    DATE_COLUMN, GROUP_COLUMN, SYMBOL_COLUMN, column_dates, column_values, groups_from_frame,
    labeled_panels_to_long, panel_from_long, panel_from_wide, panel_to_frame,
};

mod io;
pub use io::{PanelLayout, read_csv, read_groups_csv, read_panel_csv, write_csv, write_panel_csv};

mod source;
pub use source::CsvPriceSource;

mod error;
pub use error::UtilsError;
