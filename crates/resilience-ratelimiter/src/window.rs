//! Fixed-size ring buffer of recent completion latencies.

use std::collections::VecDeque;

/// Default number of samples retained before the oldest is evicted.
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// A bounded FIFO of recent operation latencies, in seconds.
pub struct LatencyWindow {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl LatencyWindow {
    /// Creates an empty window with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Records a completed-operation latency, evicting the oldest sample if full.
    pub fn push(&mut self, latency_secs: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(latency_secs.max(0.0));
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True once the window has reached its configured capacity.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// True if no samples have been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Arithmetic mean of the samples, or 0.0 if empty.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Largest recorded latency, or 0.0 if empty.
    pub fn max(&self) -> f64 {
        self.samples.iter().cloned().fold(0.0, f64::max)
    }

    /// The P95 latency, computed by nearest-rank over a sorted copy.
    pub fn p95(&self) -> f64 {
        self.quantile(0.95)
    }

    /// Arbitrary quantile in `[0, 1]`, computed by nearest-rank over a sorted copy.
    pub fn quantile(&self, q: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples.iter().cloned().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let rank = ((q.clamp(0.0, 1.0)) * (sorted.len() - 1) as f64).round() as usize;
        sorted[rank.min(sorted.len() - 1)]
    }

    /// Fraction of samples strictly greater than `threshold`.
    pub fn fraction_over(&self, threshold: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let over = self.samples.iter().filter(|&&l| l > threshold).count();
        over as f64 / self.samples.len() as f64
    }
}
