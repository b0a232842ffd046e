//! Virtual-user executor

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::context::VuContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::metrics::{MetricsSink, ITERATIONS, ITERATION_DURATION};
use crate::report::{RunReport, ScenarioReport};
use crate::scenario::{ExecutionStrategy, Scenario, ScenarioHandler, ScenarioSpec};
use crate::threshold::ThresholdSet;

/// Named set of scenarios run concurrently, plus the thresholds that decide
/// whether the run passed
#[derive(Debug, Clone)]
pub struct LoadTest {
    name: String,
    scenarios: Vec<Scenario>,
    thresholds: ThresholdSet,
}

impl LoadTest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
            thresholds: ThresholdSet::new(),
        }
    }

    pub fn scenario(mut self, spec: ScenarioSpec, handler: Arc<dyn ScenarioHandler>) -> Self {
        self.scenarios.push(Scenario::new(spec, handler));
        self
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdSet) -> Self {
        self.thresholds.extend(thresholds);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    pub fn validate(&self) -> RuntimeResult<()> {
        if self.scenarios.is_empty() {
            return Err(RuntimeError::NoScenarios(self.name.clone()));
        }
        let mut seen = BTreeSet::new();
        for scenario in &self.scenarios {
            scenario.spec.validate()?;
            if !seen.insert(scenario.spec.name.as_str()) {
                return Err(RuntimeError::DuplicateScenario(scenario.spec.name.clone()));
            }
        }
        Ok(())
    }

    /// Run every scenario to completion and evaluate the thresholds.
    ///
    /// Pools with zero VUs are skipped. Iterations in flight when a pool's
    /// duration elapses are allowed to finish.
    pub async fn run(&self) -> RuntimeResult<RunReport> {
        self.validate()?;

        let sink = MetricsSink::new();
        let started_at = Utc::now();
        let origin = Instant::now();

        info!(
            "Starting load test '{}' with {} scenario(s)",
            self.name,
            self.scenarios.len()
        );

        let mut vus = JoinSet::new();
        for (index, scenario) in self.scenarios.iter().enumerate() {
            let spec = &scenario.spec;
            if spec.virtual_users == 0 {
                debug!("Skipping scenario '{}': no virtual users", spec.name);
                continue;
            }

            info!(
                "Scenario '{}': {} VU(s), {}, {:?} after {:?}",
                spec.name, spec.virtual_users, spec.executor, spec.duration, spec.start_offset
            );

            for vu_id in 1..=spec.virtual_users {
                let ctx = VuContext::new(&spec.name, vu_id, spec.tags.clone(), sink.clone());
                let handler = Arc::clone(&scenario.handler);
                let spec = spec.clone();
                vus.spawn(async move {
                    let iterations = run_vu(origin, &spec, handler, ctx).await;
                    (index, iterations)
                });
            }
        }

        let mut iterations = vec![0u64; self.scenarios.len()];
        while let Some(joined) = vus.join_next().await {
            let (index, count) = joined?;
            iterations[index] += count;
        }

        let scenarios = self
            .scenarios
            .iter()
            .zip(iterations)
            .map(|(scenario, count)| ScenarioReport::collect(&scenario.spec, count, &sink))
            .collect();

        let report = RunReport::collect(
            &self.name,
            started_at,
            Utc::now(),
            scenarios,
            &sink,
            &self.thresholds,
        );

        info!(
            "Load test '{}' finished in {:.1}s: {}",
            self.name,
            report.duration_secs,
            if report.passed() { "passed" } else { "failed" }
        );

        Ok(report)
    }
}

async fn run_vu(
    origin: Instant,
    spec: &ScenarioSpec,
    handler: Arc<dyn ScenarioHandler>,
    mut ctx: VuContext,
) -> u64 {
    tokio::time::sleep_until(origin + spec.start_offset).await;
    let deadline = origin + spec.end();

    let limit = match spec.executor {
        ExecutionStrategy::ConstantVus => u64::MAX,
        ExecutionStrategy::PerVuIterations { iterations } => iterations,
    };

    let mut completed = 0;
    while completed < limit && Instant::now() < deadline {
        ctx.set_iteration(completed);
        let started = Instant::now();

        handler.iteration(&ctx).await;

        ctx.add_counter(ITERATIONS, 1.0, &[]);
        ctx.add_trend(
            ITERATION_DURATION,
            started.elapsed().as_secs_f64() * 1000.0,
            &[],
        );
        completed += 1;

        // handlers without await points must not starve other VUs
        tokio::task::yield_now().await;
    }

    debug!(
        "VU {} of '{}' finished after {} iteration(s)",
        ctx.vu_id(),
        spec.name,
        completed
    );
    completed
}
