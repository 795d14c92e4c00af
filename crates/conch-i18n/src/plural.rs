//! Count-based message selection
//!
//! A plural table is an ordered list of inclusive numeric ranges. The first
//! range containing `n` wins, so an exact `1..=1` entry placed before a
//! catch-all overrides it. Ranges may overlap.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the count when a template is rendered.
pub const COUNT_PLACEHOLDER: &str = "%n";

/// One `(min, max, template)` entry. A missing bound is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PluralRange {
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(rename = "text")]
    pub template: String,
}

impl PluralRange {
    pub fn new(min: Option<i64>, max: Option<i64>, template: impl Into<String>) -> Self {
        Self {
            min,
            max,
            template: template.into(),
        }
    }

    pub fn contains(&self, n: i64) -> bool {
        self.min.map_or(true, |min| min <= n) && self.max.map_or(true, |max| n <= max)
    }
}

/// Ordered plural ranges for a single message key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PluralTable {
    ranges: Vec<PluralRange>,
}

impl PluralTable {
    pub fn new(ranges: Vec<PluralRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[PluralRange] {
        &self.ranges
    }

    /// Pick the range used for `n`.
    ///
    /// Declared order decides: the first containing range wins. When no range
    /// contains `n` the last declared range (the catch-all) is used.
    pub fn select(&self, n: i64) -> Option<&PluralRange> {
        self.ranges
            .iter()
            .find(|range| range.contains(n))
            .or_else(|| self.ranges.last())
    }

    /// Render the template selected for `n`, with `%n` substituted.
    pub fn render(&self, n: i64) -> Option<String> {
        self.select(n)
            .map(|range| substitute_count(&range.template, n))
    }
}

/// Replace every `%n` in `template` with `n`.
pub fn substitute_count(template: &str, n: i64) -> String {
    template.replace(COUNT_PLACEHOLDER, &n.to_string())
}
