//! Per-virtual-user handle passed to scenario iterations

use serde::{Deserialize, Serialize};
use stampede_http::RequestOutcome;
use std::time::Duration;

use crate::checks::Checks;
use crate::metrics::{MetricsSink, Tags, HTTP_REQS, HTTP_REQ_DURATION, HTTP_REQ_FAILED};

/// Tag naming the scenario a sample came from
pub const SCENARIO_TAG: &str = "scenario";

/// Statuses that count as a non-failed request in `http_req_failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedStatus {
    /// 200..=399
    #[default]
    Success,
    Exactly(u16),
    /// 400..=499
    ClientError,
}

impl ExpectedStatus {
    pub fn matches(&self, status: u16) -> bool {
        match self {
            ExpectedStatus::Success => (200..400).contains(&status),
            ExpectedStatus::Exactly(expected) => status == *expected,
            ExpectedStatus::ClientError => (400..500).contains(&status),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VuContext {
    vu_id: u32,
    iteration: u64,
    tags: Tags,
    sink: MetricsSink,
}

impl VuContext {
    /// `base_tags` always gains the `scenario` tag
    pub fn new(scenario: &str, vu_id: u32, mut base_tags: Tags, sink: MetricsSink) -> Self {
        base_tags.insert(SCENARIO_TAG.to_string(), scenario.to_string());
        Self {
            vu_id,
            iteration: 0,
            tags: base_tags,
            sink,
        }
    }

    /// 1-based id within the scenario's pool
    pub fn vu_id(&self) -> u32 {
        self.vu_id
    }

    /// 0-based iteration counter of this VU
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub(crate) fn set_iteration(&mut self, iteration: u64) {
        self.iteration = iteration;
    }

    pub fn scenario(&self) -> &str {
        self.tags.get(SCENARIO_TAG).map(String::as_str).unwrap_or_default()
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn sink(&self) -> &MetricsSink {
        &self.sink
    }

    /// Base tags plus `extra`; `extra` wins on conflicts
    pub fn tagged(&self, extra: &[(&str, &str)]) -> Tags {
        let mut tags = self.tags.clone();
        for (key, value) in extra {
            tags.insert(key.to_string(), value.to_string());
        }
        tags
    }

    /// Record the built-in HTTP metrics for one call
    pub fn record_request(
        &self,
        outcome: &RequestOutcome,
        expected: ExpectedStatus,
        extra: &[(&str, &str)],
    ) {
        let mut tags = self.tagged(extra);
        tags.insert("method".to_string(), outcome.method.to_string());
        tags.insert("status".to_string(), outcome.status.to_string());

        self.sink.add_counter(HTTP_REQS, 1.0, tags.clone());
        self.sink
            .add_trend(HTTP_REQ_DURATION, outcome.elapsed_ms(), tags.clone());
        self.sink
            .add_rate(HTTP_REQ_FAILED, !expected.matches(outcome.status), tags);
    }

    /// Record a named check and return its result
    pub fn check(&self, name: &str, passed: bool) -> bool {
        Checks::record(&self.sink, &self.tags, name, passed)
    }

    pub fn add_trend(&self, metric: &str, value: f64, extra: &[(&str, &str)]) {
        self.sink.add_trend(metric, value, self.tagged(extra));
    }

    pub fn add_rate(&self, metric: &str, passed: bool, extra: &[(&str, &str)]) {
        self.sink.add_rate(metric, passed, self.tagged(extra));
    }

    pub fn add_counter(&self, metric: &str, value: f64, extra: &[(&str, &str)]) {
        self.sink.add_counter(metric, value, self.tagged(extra));
    }

    pub async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
