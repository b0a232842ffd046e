//! Named boolean assertions recorded into the `checks` rate

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::{MetricsSink, Tags, CHECKS};

/// Tag carrying the check name on every `checks` sample
pub const CHECK_TAG: &str = "check";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckSummary {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.passes as f64 / self.total() as f64
    }
}

pub struct Checks;

impl Checks {
    /// Record one check outcome under `tags` plus the check name
    pub fn record(sink: &MetricsSink, tags: &Tags, name: &str, passed: bool) -> bool {
        let mut tags = tags.clone();
        tags.insert(CHECK_TAG.to_string(), name.to_string());
        sink.add_rate(CHECKS, passed, tags);
        passed
    }

    /// Pass/fail counts per check name, in name order
    pub fn summarize(sink: &MetricsSink) -> Vec<CheckSummary> {
        let mut by_name: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for series in sink.series(CHECKS, &Tags::new()) {
            let name = series.tags.get(CHECK_TAG).cloned().unwrap_or_default();
            let counts = by_name.entry(name).or_default();
            let passes = series.values.iter().filter(|value| **value != 0.0).count() as u64;
            counts.0 += passes;
            counts.1 += series.values.len() as u64 - passes;
        }
        by_name
            .into_iter()
            .map(|(name, (passes, fails))| CheckSummary {
                name,
                passes,
                fails,
            })
            .collect()
    }
}
