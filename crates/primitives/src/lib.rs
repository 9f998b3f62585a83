#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorsim/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod panel;
pub use panel::{FactorMatrix, GroupWeights, Panel, PortfolioWeights, PriceTable, ReturnTable};

mod returns;
pub use returns::ReturnSeries;

mod groups;
pub use groups::{GroupAssignment, Reconciliation};

mod allocation;
pub use allocation::Allocation;

mod periodicity;
pub use periodicity::Periodicity;

mod error;
pub use error::PanelError;

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
