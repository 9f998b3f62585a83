//! # factorsim
//!
//! Factor-based portfolio backtesting.
//!
//! A factor (a date x ticker signal) is smoothed, turned into portfolio
//! weights, realized one business day later against daily returns and ranked
//! by Sharpe ratio against an equal-weight baseline.
//!
//! This crate re-exports the factorsim workspace. Individual components can be
//! enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Tables, series and group assignments
//! - `traits`: Weighting scheme and price source abstractions
//! - `math`: Return transforms, smoothing, statistics and calendar
//! - `model`: Weighting schemes, simulation, variant batches and reports
//! - `utils`: Polars interop and CSV I/O
//! - `cli`: The `analyze` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use factorsim::{math::daily_returns, model::{AnalysisConfig, analyze_factor}};
//!
//! let returns = daily_returns(&prices)?;
//! let analysis = analyze_factor("momentum", &factor, &returns, None, &AnalysisConfig::default())?;
//! println!("{}", analysis.raw.performance);
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use factorsim_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use factorsim_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use factorsim_math as math;
#[cfg(feature = "model")]
#[doc(inline)]
pub use factorsim_model as model;
#[cfg(feature = "utils")]
#[doc(inline)]
pub use factorsim_utils as utils;

// Used only by the `analyze` binary.
#[cfg(feature = "cli")]
use {anyhow as _, clap as _, config as _, tracing as _, tracing_subscriber as _};
