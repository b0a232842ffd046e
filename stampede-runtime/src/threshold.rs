//! Pass/fail rules evaluated over aggregated metrics
//!
//! Thresholds are typed values. The `metric{tag:value}` key and the
//! `p(95)<500` expression are produced only when a threshold is displayed or
//! written to a report.
//!
//! ```
//! use stampede_runtime::Threshold;
//!
//! let threshold = Threshold::new("http_req_duration")
//!     .tag("scenario", "list_products")
//!     .p(95.0)
//!     .lt(500.0);
//! assert_eq!(threshold.key(), "http_req_duration{scenario:list_products}");
//! assert_eq!(threshold.expression(), "p(95)<500");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::metrics::{MetricKind, MetricsSink, Tags};
use crate::stats::{percentile, TrendStats};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    Avg,
    Min,
    Max,
    Med,
    Percentile(f64),
    /// Share of non-zero samples
    Rate,
    /// Sum for counters, sample count otherwise
    Count,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Avg => write!(f, "avg"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
            Aggregation::Med => write!(f, "med"),
            Aggregation::Percentile(p) => write!(f, "p({})", p),
            Aggregation::Rate => write!(f, "rate"),
            Aggregation::Count => write!(f, "count"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn holds(&self, observed: f64, bound: f64) -> bool {
        match self {
            Comparison::Lt => observed < bound,
            Comparison::Le => observed <= bound,
            Comparison::Gt => observed > bound,
            Comparison::Ge => observed >= bound,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub metric: String,
    pub tags: Tags,
    pub aggregation: Aggregation,
    pub comparison: Comparison,
    pub bound: f64,
}

/// Metric and tag selection, the first half of the builder
#[derive(Debug, Clone)]
pub struct ThresholdTarget {
    metric: String,
    tags: Tags,
}

/// Selection plus aggregation, waiting for a comparison
#[derive(Debug, Clone)]
pub struct ThresholdBuilder {
    target: ThresholdTarget,
    aggregation: Aggregation,
}

impl Threshold {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(metric: impl Into<String>) -> ThresholdTarget {
        ThresholdTarget {
            metric: metric.into(),
            tags: Tags::new(),
        }
    }

    /// Same rule restricted to samples carrying `key:value`
    pub fn with_tag(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut scoped = self.clone();
        scoped.tags.insert(key.into(), value.into());
        scoped
    }

    /// `metric` or `metric{k:v,...}`
    pub fn key(&self) -> String {
        if self.tags.is_empty() {
            return self.metric.clone();
        }
        let tags: Vec<String> = self
            .tags
            .iter()
            .map(|(key, value)| format!("{}:{}", key, value))
            .collect();
        format!("{}{{{}}}", self.metric, tags.join(","))
    }

    /// `p(95)<500`, `rate<0.01`, ...
    pub fn expression(&self) -> String {
        format!("{}{}{}", self.aggregation, self.comparison.symbol(), self.bound)
    }

    /// Aggregate the matching samples; `None` when nothing matched
    pub fn observe(&self, sink: &MetricsSink) -> Option<f64> {
        let mut values = sink.values(&self.metric, &self.tags);
        if values.is_empty() {
            return None;
        }
        match self.aggregation {
            Aggregation::Avg => TrendStats::from_values(&values).map(|stats| stats.avg),
            Aggregation::Min => TrendStats::from_values(&values).map(|stats| stats.min),
            Aggregation::Max => TrendStats::from_values(&values).map(|stats| stats.max),
            Aggregation::Med => TrendStats::from_values(&values).map(|stats| stats.med),
            Aggregation::Percentile(p) => {
                values.sort_by(|a, b| a.total_cmp(b));
                percentile(&values, p)
            }
            Aggregation::Rate => {
                let passes = values.iter().filter(|value| **value != 0.0).count();
                Some(passes as f64 / values.len() as f64)
            }
            Aggregation::Count => match sink.kind_of(&self.metric) {
                Some(MetricKind::Counter) => Some(values.iter().sum()),
                _ => Some(values.len() as f64),
            },
        }
    }

    /// Evaluate against the sink; a threshold without data passes
    pub fn evaluate(&self, sink: &MetricsSink) -> ThresholdResult {
        let observed = self.observe(sink);
        ThresholdResult {
            key: self.key(),
            expression: self.expression(),
            observed,
            passed: observed.map_or(true, |value| self.comparison.holds(value, self.bound)),
            no_data: observed.is_none(),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key(), self.expression())
    }
}

impl ThresholdTarget {
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn aggregate(self, aggregation: Aggregation) -> ThresholdBuilder {
        ThresholdBuilder {
            target: self,
            aggregation,
        }
    }

    pub fn p(self, percentile: f64) -> ThresholdBuilder {
        self.aggregate(Aggregation::Percentile(percentile))
    }

    pub fn avg(self) -> ThresholdBuilder {
        self.aggregate(Aggregation::Avg)
    }

    pub fn med(self) -> ThresholdBuilder {
        self.aggregate(Aggregation::Med)
    }

    pub fn max(self) -> ThresholdBuilder {
        self.aggregate(Aggregation::Max)
    }

    pub fn rate(self) -> ThresholdBuilder {
        self.aggregate(Aggregation::Rate)
    }

    pub fn count(self) -> ThresholdBuilder {
        self.aggregate(Aggregation::Count)
    }
}

impl ThresholdBuilder {
    fn compare(self, comparison: Comparison, bound: f64) -> Threshold {
        Threshold {
            metric: self.target.metric,
            tags: self.target.tags,
            aggregation: self.aggregation,
            comparison,
            bound,
        }
    }

    pub fn lt(self, bound: f64) -> Threshold {
        self.compare(Comparison::Lt, bound)
    }

    pub fn le(self, bound: f64) -> Threshold {
        self.compare(Comparison::Le, bound)
    }

    pub fn gt(self, bound: f64) -> Threshold {
        self.compare(Comparison::Gt, bound)
    }

    pub fn ge(self, bound: f64) -> Threshold {
        self.compare(Comparison::Ge, bound)
    }
}

/// Outcome of one threshold at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub key: String,
    pub expression: String,
    pub observed: Option<f64>,
    pub passed: bool,
    #[serde(default)]
    pub no_data: bool,
}

/// Ordered collection of thresholds without duplicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdSet {
    thresholds: Vec<Threshold>,
}

impl ThresholdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, threshold: Threshold) -> Self {
        self.push(threshold);
        self
    }

    pub fn push(&mut self, threshold: Threshold) {
        if !self.thresholds.contains(&threshold) {
            self.thresholds.push(threshold);
        }
    }

    pub fn extend(&mut self, other: ThresholdSet) {
        for threshold in other.thresholds {
            self.push(threshold);
        }
    }

    /// Copy of every threshold restricted to `key:value`
    pub fn scoped(&self, key: &str, value: &str) -> Self {
        self.thresholds
            .iter()
            .map(|threshold| threshold.with_tag(key, value))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Threshold> {
        self.thresholds.iter()
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn evaluate(&self, sink: &MetricsSink) -> Vec<ThresholdResult> {
        self.thresholds
            .iter()
            .map(|threshold| threshold.evaluate(sink))
            .collect()
    }

    /// `key -> [expression, ...]` map in the load runtime's string format
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for threshold in &self.thresholds {
            map.entry(threshold.key())
                .or_default()
                .push(threshold.expression());
        }
        map
    }
}

impl FromIterator<Threshold> for ThresholdSet {
    fn from_iter<I: IntoIterator<Item = Threshold>>(iter: I) -> Self {
        let mut set = ThresholdSet::new();
        for threshold in iter {
            set.push(threshold);
        }
        set
    }
}

impl IntoIterator for ThresholdSet {
    type Item = Threshold;
    type IntoIter = std::vec::IntoIter<Threshold>;

    fn into_iter(self) -> Self::IntoIter {
        self.thresholds.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{tags, HTTP_REQ_DURATION, HTTP_REQ_FAILED, ITERATIONS};

    #[test]
    fn test_key_and_expression() {
        let threshold = Threshold::new(HTTP_REQ_FAILED).rate().lt(0.01);
        assert_eq!(threshold.key(), "http_req_failed");
        assert_eq!(threshold.expression(), "rate<0.01");

        let threshold = Threshold::new(HTTP_REQ_DURATION)
            .tag("scenario", "crud")
            .tag("operation", "write")
            .p(99.0)
            .lt(1500.0);
        assert_eq!(
            threshold.to_string(),
            "http_req_duration{operation:write,scenario:crud}: p(99)<1500"
        );

        assert_eq!(Threshold::new("checks").rate().gt(0.95).expression(), "rate>0.95");
    }

    #[test]
    fn test_scoped_threshold_only_sees_tagged_samples() {
        let sink = MetricsSink::new();
        sink.add_trend(HTTP_REQ_DURATION, 900.0, tags(&[("scenario", "create_products")]));
        sink.add_trend(HTTP_REQ_DURATION, 100.0, tags(&[("scenario", "list_products")]));

        let set = ThresholdSet::new().with(Threshold::new(HTTP_REQ_DURATION).p(95.0).lt(500.0));
        let scoped = set.scoped("scenario", "list_products");

        assert!(!set.evaluate(&sink)[0].passed);
        let result = &scoped.evaluate(&sink)[0];
        assert!(result.passed);
        assert_eq!(result.observed, Some(100.0));
        assert_eq!(result.key, "http_req_duration{scenario:list_products}");
    }

    #[test]
    fn test_threshold_without_data_passes() {
        let sink = MetricsSink::new();
        let result = Threshold::new("crud_flow_success").rate().gt(0.95).evaluate(&sink);

        assert!(result.passed);
        assert!(result.no_data);
        assert_eq!(result.observed, None);
    }

    #[test]
    fn test_count_sums_counters() {
        let sink = MetricsSink::new();
        sink.add_counter(ITERATIONS, 1.0, Tags::new());
        sink.add_counter(ITERATIONS, 2.0, Tags::new());

        let threshold = Threshold::new(ITERATIONS).count().ge(3.0);
        assert_eq!(threshold.observe(&sink), Some(3.0));
        assert!(threshold.evaluate(&sink).passed);
    }

    #[test]
    fn test_set_deduplicates_and_maps() {
        let mut set = ThresholdSet::new();
        set.push(Threshold::new(HTTP_REQ_DURATION).p(95.0).lt(500.0));
        set.push(Threshold::new(HTTP_REQ_DURATION).p(95.0).lt(500.0));
        set.push(Threshold::new(HTTP_REQ_DURATION).p(99.0).lt(1000.0));

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.to_map().get(HTTP_REQ_DURATION),
            Some(&vec!["p(95)<500".to_string(), "p(99)<1000".to_string()])
        );
    }
}
