#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorsim/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod weighting;
pub use weighting::{GroupNeutralWeighting, RawWeighting, WeightingConfig, factor_strategy};

mod simulation;
pub use simulation::{STRATEGY_LABEL, SimulatedReturns, calc_allocation_returns, calc_returns};

mod variants;
pub use variants::{
    BatchConfig, BatchResult, EQUAL_WEIGHT_LABEL, StrategyConfig, VariantFailure, VariantResult,
    VariantSignal, VariantSpec, baseline_label, performance_data, performance_data_list,
    roll_label,
};

mod performance;
pub use performance::{
    ExcludedVariant, PerformanceRow, PerformanceTable, StatsConfig, calc_performance,
};

mod analysis;
pub use analysis::{AnalysisConfig, BatchReport, FactorAnalysis, analyze_factor};

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use factorsim_traits::{AlignmentPolicy, AllocationPolicy, EmptyDatePolicy, WeightingScheme};

    pub use super::{
        AnalysisConfig, BatchConfig, GroupNeutralWeighting, ModelError, RawWeighting,
        StrategyConfig, analyze_factor, calc_performance, calc_returns, factor_strategy,
        performance_data, performance_data_list,
    };
}
