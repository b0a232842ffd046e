//! Discrete weighted choice

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeightError {
    #[error("Weighted choice needs at least one entry")]
    Empty,

    #[error("Weight at position {index} must be positive and finite, got {weight}")]
    InvalidWeight { index: usize, weight: f64 },
}

/// Ordered `(weight, item)` pairs selected by cumulative probability
#[derive(Debug, Clone)]
pub struct WeightedChoice<T> {
    items: Vec<T>,
    /// Normalised running totals; the last entry is 1.0
    cumulative: Vec<f64>,
}

impl<T> WeightedChoice<T> {
    pub fn new(entries: Vec<(f64, T)>) -> Result<Self, WeightError> {
        if entries.is_empty() {
            return Err(WeightError::Empty);
        }
        if let Some((index, (weight, _))) = entries
            .iter()
            .enumerate()
            .find(|(_, (weight, _))| !weight.is_finite() || *weight <= 0.0)
        {
            return Err(WeightError::InvalidWeight {
                index,
                weight: *weight,
            });
        }

        let total: f64 = entries.iter().map(|(weight, _)| weight).sum();
        let mut running = 0.0;
        let mut cumulative = Vec::with_capacity(entries.len());
        let mut items = Vec::with_capacity(entries.len());
        for (weight, item) in entries {
            running += weight / total;
            cumulative.push(running);
            items.push(item);
        }
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }

        Ok(Self { items, cumulative })
    }

    /// Choice with a single always-selected item
    pub fn single(item: T) -> Self {
        Self {
            items: vec![item],
            cumulative: vec![1.0],
        }
    }

    /// Item whose cumulative band contains `r`, for `r` in `[0, 1)`
    pub fn pick(&self, r: f64) -> &T {
        let index = self
            .cumulative
            .partition_point(|bound| *bound <= r)
            .min(self.items.len() - 1);
        &self.items[index]
    }

    pub fn choose(&self) -> &T {
        self.pick(fastrand::f64())
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
