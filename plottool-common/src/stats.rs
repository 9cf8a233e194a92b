use std::sync::{Arc, RwLock};

/// Running min/max/avg/last over successfully collected samples.
///
/// Every accessor reports zero until the first sample is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Statistics {
    min: f64,
    max: f64,
    sum: f64,
    count: u64,
    last: f64,
}

impl Statistics {
    pub fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count += 1;
        self.last = value;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn min(&self) -> f64 {
        self.or_zero(self.min)
    }

    pub fn max(&self) -> f64 {
        self.or_zero(self.max)
    }

    pub fn last(&self) -> f64 {
        self.or_zero(self.last)
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn or_zero(&self, value: f64) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            value
        }
    }
}

/// Statistics of a source, the secondary series stays empty for
/// single-value sources.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DualStatistics {
    pub primary: Statistics,
    pub secondary: Statistics,
}

impl DualStatistics {
    pub fn single(primary: Statistics) -> Self {
        Self {
            primary,
            secondary: Statistics::default(),
        }
    }

    /// Largest value observed across both series.
    pub fn max(&self) -> f64 {
        self.primary.max().max(self.secondary.max())
    }
}

/// Statistics published by a collector thread for the render loop.
pub type SharedStats = Arc<RwLock<DualStatistics>>;
