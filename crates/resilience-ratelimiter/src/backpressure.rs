//! Backpressure scoring: turns a window of recent latencies into a 0..1 stress score.

use crate::window::LatencyWindow;

/// Parameters driving the backpressure score.
#[derive(Debug, Clone)]
pub struct BackpressureConfig {
    /// Baseline P95 latency; samples above this contribute to the score.
    pub p95_baseline: f64,
    /// Floor latency used as the gradient component's reference point.
    pub min_latency: f64,
    /// Minimum number of window samples required before scoring (else `b = 0`).
    pub min_samples: usize,
    /// Sensitivity of the gradient component to mean latency drift above `min_latency`.
    pub gradient_sensitivity: f64,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            p95_baseline: 0.1,
            min_latency: 0.01,
            min_samples: 1,
            gradient_sensitivity: 1.0,
        }
    }
}

/// Scores system stress in `[0, 1]` from a latency window, adapting its baseline over time.
pub struct BackpressureCalculator {
    config: BackpressureConfig,
    p95_baseline: f64,
}

impl BackpressureCalculator {
    /// Creates a calculator from the given parameters.
    pub fn new(config: BackpressureConfig) -> Self {
        let p95_baseline = config.p95_baseline;
        Self {
            config,
            p95_baseline,
        }
    }

    /// Current adapted P95 baseline.
    pub fn p95_baseline(&self) -> f64 {
        self.p95_baseline
    }

    /// Computes the backpressure score `b` from the given window.
    ///
    /// `b = 0` whenever the window holds fewer than `min_samples` samples (cold start).
    pub fn score(&self, window: &LatencyWindow) -> f64 {
        if window.len() < self.config.min_samples {
            return 0.0;
        }

        let p95_component = window.fraction_over(self.p95_baseline);

        let gradient_denominator = self.config.min_latency * self.config.gradient_sensitivity;
        let gradient_component = if gradient_denominator > 0.0 {
            ((window.mean() - self.config.min_latency) / gradient_denominator).clamp(0.0, 1.0)
        } else {
            0.0
        };

        p95_component.max(gradient_component).clamp(0.0, 1.0)
    }

    /// Adapts the baseline toward the window's measured P95 via an EMA.
    ///
    /// Intended to be called once the window has reached its configured capacity
    /// (i.e. after every `window_size` completed samples), per the spec's drift policy.
    pub fn adapt_baseline(&mut self, window: &LatencyWindow) {
        if !window.is_full() {
            return;
        }
        let measured = window.p95();
        self.p95_baseline = 0.95 * self.p95_baseline + 0.05 * measured;
    }
}
