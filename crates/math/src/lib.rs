#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorsim/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod returns;
pub use returns::{cumulative_returns, cumulative_series, daily_returns};

mod signal;
pub use signal::{equal_weight, roll};

mod stats;
pub use stats::{
    Reference, annualized_volatility, drawdown_series, max_drawdown, mean, sharpe, sharpe_ratio,
    std_dev, worst_drawdown,
};

mod calendar;
pub use calendar::{business_days, is_business_day, next_business_day, shift_business_days};

mod error;
pub use error::MathError;
