//! Per-endpoint service level objectives

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Domain of the products resource
pub const PRODUCTS: &str = "products";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    List,
    Details,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Details => "details",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn all() -> &'static [Operation] {
        &[
            Operation::List,
            Operation::Details,
            Operation::Create,
            Operation::Update,
            Operation::Delete,
        ]
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Operation::Create | Operation::Update | Operation::Delete)
    }

    /// Value of the `operation` tag: `read` or `write`
    pub fn kind(&self) -> &'static str {
        if self.is_write() {
            "write"
        } else {
            "read"
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::all()
            .iter()
            .find(|operation| operation.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown operation '{}'", s))
    }
}

/// Latency and error-rate targets for one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndpointSlo {
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Fraction in [0, 1]
    pub error_rate: f64,
}

impl EndpointSlo {
    pub const fn new(p95_ms: f64, p99_ms: f64, error_rate: f64) -> Self {
        Self {
            p95_ms,
            p99_ms,
            error_rate,
        }
    }
}

static DEFAULT_TABLE: Lazy<SloTable> = Lazy::new(|| {
    SloTable::new()
        .with(PRODUCTS, Operation::List, EndpointSlo::new(500.0, 1000.0, 0.01))
        .with(PRODUCTS, Operation::Details, EndpointSlo::new(300.0, 600.0, 0.01))
        .with(PRODUCTS, Operation::Create, EndpointSlo::new(800.0, 1500.0, 0.02))
        .with(PRODUCTS, Operation::Update, EndpointSlo::new(800.0, 1500.0, 0.02))
        .with(PRODUCTS, Operation::Delete, EndpointSlo::new(500.0, 1000.0, 0.02))
});

/// Read-only `(domain, operation) -> SLO` table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SloTable {
    entries: BTreeMap<(String, Operation), EndpointSlo>,
}

impl SloTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide table for the products API
    pub fn defaults() -> &'static SloTable {
        &DEFAULT_TABLE
    }

    pub fn with(mut self, domain: &str, operation: Operation, slo: EndpointSlo) -> Self {
        self.entries.insert((domain.to_string(), operation), slo);
        self
    }

    pub fn get(&self, domain: &str, operation: Operation) -> Option<&EndpointSlo> {
        self.entries.get(&(domain.to_string(), operation))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
