//! Scenario declarations: how many VUs run which handler, and for how long

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::context::VuContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::metrics::Tags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Every VU loops until the scenario duration elapses
    ConstantVus,
    /// Every VU runs a fixed number of iterations; duration caps the run
    PerVuIterations { iterations: u64 },
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStrategy::ConstantVus => write!(f, "constant-vus"),
            ExecutionStrategy::PerVuIterations { iterations } => {
                write!(f, "per-vu-iterations({})", iterations)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSpec {
    pub name: String,
    pub executor: ExecutionStrategy,
    pub virtual_users: u32,
    pub duration: Duration,
    pub start_offset: Duration,
    /// Tags attached to every sample of this scenario
    pub tags: Tags,
}

impl ScenarioSpec {
    pub fn constant_vus(name: impl Into<String>, virtual_users: u32, duration: Duration) -> Self {
        Self {
            name: name.into(),
            executor: ExecutionStrategy::ConstantVus,
            virtual_users,
            duration,
            start_offset: Duration::ZERO,
            tags: Tags::new(),
        }
    }

    pub fn per_vu_iterations(
        name: impl Into<String>,
        virtual_users: u32,
        iterations: u64,
        max_duration: Duration,
    ) -> Self {
        Self {
            executor: ExecutionStrategy::PerVuIterations { iterations },
            ..Self::constant_vus(name, virtual_users, max_duration)
        }
    }

    pub fn starting_after(mut self, offset: Duration) -> Self {
        self.start_offset = offset;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Offset plus duration: when the last iteration may start
    pub fn end(&self) -> Duration {
        self.start_offset + self.duration
    }

    pub fn validate(&self) -> RuntimeResult<()> {
        let invalid = |reason: &str| RuntimeError::InvalidScenario {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if self.duration.is_zero() {
            return Err(invalid("duration must be greater than zero"));
        }
        if let ExecutionStrategy::PerVuIterations { iterations: 0 } = self.executor {
            return Err(invalid("iterations must be greater than zero"));
        }
        Ok(())
    }
}

/// Body of one scenario iteration.
///
/// Called repeatedly on each VU; request-level failures are recorded through
/// the context, never returned.
#[async_trait]
pub trait ScenarioHandler: Send + Sync {
    async fn iteration(&self, ctx: &VuContext);
}

/// A spec bound to the handler its VUs run
#[derive(Clone)]
pub struct Scenario {
    pub spec: ScenarioSpec,
    pub handler: Arc<dyn ScenarioHandler>,
}

impl Scenario {
    pub fn new(spec: ScenarioSpec, handler: Arc<dyn ScenarioHandler>) -> Self {
        Self { spec, handler }
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario").field("spec", &self.spec).finish()
    }
}
