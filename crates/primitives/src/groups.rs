//! Ticker grouping (sector) definitions.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Maps each ticker to exactly one group label, e.g. its GICS sector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupAssignment {
    members: BTreeMap<String, String>,
}

impl GroupAssignment {
    /// Create an empty assignment.
    #[must_use]
    pub const fn new() -> Self {
        Self { members: BTreeMap::new() }
    }

    /// Assign a ticker to a group, returning its previous group if any.
    pub fn insert(&mut self, ticker: impl Into<String>, group: impl Into<String>) -> Option<String> {
        self.members.insert(ticker.into(), group.into())
    }

    /// Group of a ticker.
    #[must_use]
    pub fn group_of(&self, ticker: &str) -> Option<&str> {
        self.members.get(ticker).map(String::as_str)
    }

    /// Distinct group labels, sorted.
    #[must_use]
    pub fn groups(&self) -> Vec<&str> {
        self.members.values().map(String::as_str).collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Number of assigned tickers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate over `(ticker, group)` pairs in ticker order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.members.iter().map(|(t, g)| (t.as_str(), g.as_str()))
    }

    /// Split `tickers` into those with a group and those without.
    #[must_use]
    pub fn reconcile(&self, tickers: &[String]) -> Reconciliation {
        let (aligned, unaligned) =
            tickers.iter().cloned().partition(|t| self.members.contains_key(t));
        Reconciliation { aligned, unaligned }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for GroupAssignment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { members: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Partition of a ticker universe against a [`GroupAssignment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Tickers present in the assignment, in input order.
    pub aligned: Vec<String>,
    /// Tickers with no group.
    pub unaligned: Vec<String>,
}

impl Reconciliation {
    /// True when every ticker found a group.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unaligned.is_empty()
    }
}
