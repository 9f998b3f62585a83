//! Sampling frequency of a return series.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// How often returns are observed; drives annualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    /// Business-daily returns (252 per year).
    #[default]
    #[display("daily")]
    Daily,
    /// Weekly returns (52 per year).
    #[display("weekly")]
    Weekly,
    /// Monthly returns (12 per year).
    #[display("monthly")]
    Monthly,
    /// Any other number of periods per year.
    #[display("{_0}/year")]
    Custom(u32),
}

impl Periodicity {
    /// Number of periods in one year.
    #[must_use]
    pub const fn periods_per_year(self) -> u32 {
        match self {
            Self::Daily => 252,
            Self::Weekly => 52,
            Self::Monthly => 12,
            Self::Custom(n) => n,
        }
    }

    /// Multiplier turning a per-period ratio into an annual one.
    #[must_use]
    pub fn annualization(self) -> f64 {
        f64::from(self.periods_per_year()).sqrt()
    }
}
