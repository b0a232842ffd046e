//! Aggregations over metric samples

use serde::{Deserialize, Serialize};

/// Nearest-rank percentile of an ascending slice
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    let index = rank.clamp(1, sorted.len()) - 1;
    Some(sorted[index])
}

/// Latency-style distribution summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendStats {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub med: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl TrendStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let first = *sorted.first()?;
        let last = *sorted.last()?;
        let at = |p: f64| percentile(&sorted, p).unwrap_or(last);

        Some(Self {
            count: sorted.len() as u64,
            min: first,
            max: last,
            avg: sorted.iter().sum::<f64>() / sorted.len() as f64,
            med: at(50.0),
            p90: at(90.0),
            p95: at(95.0),
            p99: at(99.0),
        })
    }
}

/// Share of non-zero samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateStats {
    pub passes: u64,
    pub fails: u64,
    pub rate: f64,
}

impl RateStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let passes = values.iter().filter(|value| **value != 0.0).count() as u64;
        let fails = values.len() as u64 - passes;
        Some(Self {
            passes,
            fails,
            rate: passes as f64 / values.len() as f64,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterStats {
    pub count: f64,
    pub samples: u64,
}

impl CounterStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            count: values.iter().sum(),
            samples: values.len() as u64,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetricSummary {
    Trend(TrendStats),
    Rate(RateStats),
    Counter(CounterStats),
}
