//! In-process load runtime for Stampede
//!
//! Runs pools of virtual users against a [`ScenarioHandler`], collects tagged
//! samples into a shared [`MetricsSink`], and evaluates a [`ThresholdSet`]
//! into a serialisable [`RunReport`].

pub mod checks;
pub mod context;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod report;
pub mod scenario;
pub mod stats;
pub mod threshold;

pub use checks::{CheckSummary, Checks, CHECK_TAG};
pub use context::{ExpectedStatus, VuContext, SCENARIO_TAG};
pub use error::{RuntimeError, RuntimeResult};
pub use executor::LoadTest;
pub use metrics::{tags, MetricKind, MetricsSink, Series, Tags};
pub use report::{RunReport, ScenarioReport};
pub use scenario::{ExecutionStrategy, Scenario, ScenarioHandler, ScenarioSpec};
pub use stats::{CounterStats, MetricSummary, RateStats, TrendStats};
pub use threshold::{Aggregation, Comparison, Threshold, ThresholdResult, ThresholdSet};
