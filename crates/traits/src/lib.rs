#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorsim/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod weighting;
pub use weighting::{
    AlignmentPolicy, AllocationPolicy, EmptyDatePolicy, WeightingError, WeightingScheme,
};

mod source;
pub use source::{PriceSource, SourceError};
