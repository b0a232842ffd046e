//! Tagged metric samples shared by every virtual user

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::stats::{CounterStats, MetricSummary, RateStats, TrendStats};

/// Total requests issued
pub const HTTP_REQS: &str = "http_reqs";
/// Request latency in milliseconds
pub const HTTP_REQ_DURATION: &str = "http_req_duration";
/// 1 when a request did not match its expected status
pub const HTTP_REQ_FAILED: &str = "http_req_failed";
/// Outcome of every named check
pub const CHECKS: &str = "checks";
/// Completed scenario iterations
pub const ITERATIONS: &str = "iterations";
/// Wall time of one scenario iteration in milliseconds
pub const ITERATION_DURATION: &str = "iteration_duration";

/// String key/value pairs attached to a sample
pub type Tags = BTreeMap<String, String>;

/// How samples of a metric are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Trend,
    Rate,
    Counter,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Trend => write!(f, "trend"),
            MetricKind::Rate => write!(f, "rate"),
            MetricKind::Counter => write!(f, "counter"),
        }
    }
}

/// Every value recorded for one metric under one exact tag set
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub tags: Tags,
    pub values: Vec<f64>,
}

/// Whether `tags` carries every pair of `filter`
pub fn tags_match(tags: &Tags, filter: &Tags) -> bool {
    filter.iter().all(|(key, value)| tags.get(key) == Some(value))
}

#[derive(Debug, Default)]
struct SinkState {
    kinds: BTreeMap<String, MetricKind>,
    /// metric -> tag set -> values, each tag set stored once
    series: BTreeMap<String, BTreeMap<Tags, Vec<f64>>>,
    count: usize,
}

/// Append-only sample store.
///
/// Cloning shares the underlying store. A metric's kind is fixed by its
/// first sample; samples recorded under a different kind are dropped.
/// Values are grouped by their exact tag set, so memory grows with the
/// number of samples plus the number of distinct tag sets.
#[derive(Debug, Clone, Default)]
pub struct MetricsSink {
    state: Arc<Mutex<SinkState>>,
}

impl MetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, metric: &str, kind: MetricKind, value: f64, tags: Tags) {
        let mut state = self.state.lock();
        let registered = *state.kinds.entry(metric.to_string()).or_insert(kind);
        if registered != kind {
            warn!(
                "Dropping {} sample for '{}': metric already registered as {}",
                kind, metric, registered
            );
            return;
        }
        let by_tags = state.series.entry(metric.to_string()).or_default();
        match by_tags.get_mut(&tags) {
            Some(values) => values.push(value),
            None => {
                by_tags.insert(tags, vec![value]);
            }
        }
        state.count += 1;
    }

    pub fn add_trend(&self, metric: &str, value: f64, tags: Tags) {
        self.record(metric, MetricKind::Trend, value, tags);
    }

    pub fn add_rate(&self, metric: &str, passed: bool, tags: Tags) {
        self.record(metric, MetricKind::Rate, if passed { 1.0 } else { 0.0 }, tags);
    }

    pub fn add_counter(&self, metric: &str, value: f64, tags: Tags) {
        self.record(metric, MetricKind::Counter, value, tags);
    }

    pub fn kind_of(&self, metric: &str) -> Option<MetricKind> {
        self.state.lock().kinds.get(metric).copied()
    }

    /// Registered metrics in name order
    pub fn metrics(&self) -> Vec<(String, MetricKind)> {
        self.state
            .lock()
            .kinds
            .iter()
            .map(|(name, kind)| (name.clone(), *kind))
            .collect()
    }

    /// Values of `metric` whose tags match `filter`, grouped by tag set
    pub fn values(&self, metric: &str, filter: &Tags) -> Vec<f64> {
        let state = self.state.lock();
        state
            .series
            .get(metric)
            .into_iter()
            .flatten()
            .filter(|(tags, _)| tags_match(tags, filter))
            .flat_map(|(_, values)| values.iter().copied())
            .collect()
    }

    /// Tag sets of `metric` matching `filter`, in tag order
    pub fn series(&self, metric: &str, filter: &Tags) -> Vec<Series> {
        let state = self.state.lock();
        state
            .series
            .get(metric)
            .into_iter()
            .flatten()
            .filter(|(tags, _)| tags_match(tags, filter))
            .map(|(tags, values)| Series {
                tags: tags.clone(),
                values: values.clone(),
            })
            .collect()
    }

    /// Aggregate the matching samples; `None` for an unknown metric or no match
    pub fn summarize(&self, metric: &str, filter: &Tags) -> Option<MetricSummary> {
        let kind = self.kind_of(metric)?;
        let values = self.values(metric, filter);
        match kind {
            MetricKind::Trend => TrendStats::from_values(&values).map(MetricSummary::Trend),
            MetricKind::Rate => RateStats::from_values(&values).map(MetricSummary::Rate),
            MetricKind::Counter => CounterStats::from_values(&values).map(MetricSummary::Counter),
        }
    }

    /// Total samples recorded
    pub fn len(&self) -> usize {
        self.state.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build a tag map from borrowed pairs
pub fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
