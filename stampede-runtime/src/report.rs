//! Run report written at the end of every load test

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::checks::{CheckSummary, Checks};
use crate::context::SCENARIO_TAG;
use crate::error::RuntimeResult;
use crate::metrics::{tags, MetricsSink, Tags, HTTP_REQ_DURATION, HTTP_REQ_FAILED};
use crate::scenario::{ExecutionStrategy, ScenarioSpec};
use crate::stats::{MetricSummary, RateStats, TrendStats};
use crate::threshold::{ThresholdResult, ThresholdSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub executor: ExecutionStrategy,
    pub virtual_users: u32,
    pub start_offset_secs: f64,
    pub duration_secs: f64,
    pub iterations: u64,
    pub http_req_duration: Option<TrendStats>,
    pub http_req_failed: Option<RateStats>,
}

impl ScenarioReport {
    pub fn collect(spec: &ScenarioSpec, iterations: u64, sink: &MetricsSink) -> Self {
        let filter = tags(&[(SCENARIO_TAG, spec.name.as_str())]);
        let http_req_duration = match sink.summarize(HTTP_REQ_DURATION, &filter) {
            Some(MetricSummary::Trend(stats)) => Some(stats),
            _ => None,
        };
        let http_req_failed = match sink.summarize(HTTP_REQ_FAILED, &filter) {
            Some(MetricSummary::Rate(stats)) => Some(stats),
            _ => None,
        };

        Self {
            name: spec.name.clone(),
            executor: spec.executor,
            virtual_users: spec.virtual_users,
            start_offset_secs: spec.start_offset.as_secs_f64(),
            duration_secs: spec.duration.as_secs_f64(),
            iterations,
            http_req_duration,
            http_req_failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub test: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub scenarios: Vec<ScenarioReport>,
    /// Untagged summary of every metric recorded during the run
    pub metrics: BTreeMap<String, MetricSummary>,
    pub checks: Vec<CheckSummary>,
    pub thresholds: Vec<ThresholdResult>,
    pub passed: bool,
}

impl RunReport {
    pub fn collect(
        test: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        scenarios: Vec<ScenarioReport>,
        sink: &MetricsSink,
        thresholds: &ThresholdSet,
    ) -> Self {
        let metrics = sink
            .metrics()
            .into_iter()
            .filter_map(|(name, _)| {
                sink.summarize(&name, &Tags::new())
                    .map(|summary| (name, summary))
            })
            .collect();
        let thresholds = thresholds.evaluate(sink);
        let passed = thresholds.iter().all(|result| result.passed);
        let duration_secs = (finished_at - started_at)
            .to_std()
            .map(|duration| duration.as_secs_f64())
            .unwrap_or_default();

        Self {
            test: test.into(),
            started_at,
            finished_at,
            duration_secs,
            scenarios,
            metrics,
            checks: Checks::summarize(sink),
            thresholds,
            passed,
        }
    }

    /// Whether every threshold held
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn failed_thresholds(&self) -> impl Iterator<Item = &ThresholdResult> {
        self.thresholds.iter().filter(|result| !result.passed)
    }

    /// (passes, fails) over all checks
    pub fn check_totals(&self) -> (u64, u64) {
        self.checks.iter().fold((0, 0), |(passes, fails), check| {
            (passes + check.passes, fails + check.fails)
        })
    }

    pub fn total_iterations(&self) -> u64 {
        self.scenarios.iter().map(|scenario| scenario.iterations).sum()
    }

    pub fn trend(&self, metric: &str) -> Option<&TrendStats> {
        match self.metrics.get(metric) {
            Some(MetricSummary::Trend(stats)) => Some(stats),
            _ => None,
        }
    }

    pub fn rate(&self, metric: &str) -> Option<&RateStats> {
        match self.metrics.get(metric) {
            Some(MetricSummary::Rate(stats)) => Some(stats),
            _ => None,
        }
    }

    pub fn to_json(&self, pretty: bool) -> RuntimeResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CHECKS;
    use crate::threshold::Threshold;
    use std::time::Duration;

    fn sample_sink() -> MetricsSink {
        let sink = MetricsSink::new();
        let list = tags(&[(SCENARIO_TAG, "list_products")]);
        sink.add_trend(HTTP_REQ_DURATION, 120.0, list.clone());
        sink.add_trend(HTTP_REQ_DURATION, 80.0, list.clone());
        sink.add_rate(HTTP_REQ_FAILED, false, list.clone());
        sink.add_rate(HTTP_REQ_FAILED, true, list.clone());
        Checks::record(&sink, &list, "status is 200", true);
        Checks::record(&sink, &list, "status is 200", false);
        sink
    }

    #[test]
    fn test_collect_summarizes_metrics_and_thresholds() {
        let sink = sample_sink();
        let spec = ScenarioSpec::constant_vus("list_products", 2, Duration::from_secs(5));
        let thresholds = ThresholdSet::new()
            .with(Threshold::new(HTTP_REQ_DURATION).p(95.0).lt(500.0))
            .with(Threshold::new(HTTP_REQ_FAILED).rate().lt(0.05));

        let started = Utc::now();
        let report = RunReport::collect(
            "get-endpoint",
            started,
            started + chrono::Duration::seconds(5),
            vec![ScenarioReport::collect(&spec, 4, &sink)],
            &sink,
            &thresholds,
        );

        assert!(!report.passed());
        assert_eq!(report.failed_thresholds().count(), 1);
        assert_eq!(report.check_totals(), (1, 1));
        assert_eq!(report.total_iterations(), 4);
        assert_eq!(report.duration_secs, 5.0);
        assert_eq!(report.trend(HTTP_REQ_DURATION).map(|t| t.max), Some(120.0));
        assert_eq!(report.rate(CHECKS).map(|r| r.rate), Some(0.5));

        let scenario = &report.scenarios[0];
        assert_eq!(scenario.http_req_duration.as_ref().map(|t| t.count), Some(2));
        assert_eq!(scenario.http_req_failed.as_ref().map(|r| r.passes), Some(1));
    }

    #[test]
    fn test_json_round_trip() {
        let sink = sample_sink();
        let started = Utc::now();
        let report = RunReport::collect("crud", started, started, vec![], &sink, &ThresholdSet::new());

        let json = report.to_json(true).unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.test, "crud");
        assert!(parsed.passed);
        assert!(json.contains("\"type\": \"trend\""));
    }
}
