//! Backoff strategies for spacing out retry attempts.

use rand::Rng;
use std::time::Duration;

/// Computes the delay to wait before a given retry attempt.
///
/// `attempt` is zero-indexed: `0` is the delay before the first retry
/// (i.e. after the initial call has already failed once).
pub trait IntervalFunction: Send + Sync {
    /// Returns the delay to wait before making `attempt`.
    fn next_delay(&self, attempt: usize) -> Duration;
}

/// A constant delay between every attempt.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    /// Creates a fixed interval of `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_delay(&self, _attempt: usize) -> Duration {
        self.interval
    }
}

/// Full-jitter exponential backoff.
///
/// Before attempt `k`, waits `min(max_delay, initial · multiplier^k) · jitter`
/// where `jitter` is drawn uniformly from `[0.5, 1.5)`. This is the default
/// backoff used by [`RetryConfigBuilder::exponential_backoff`].
///
/// [`RetryConfigBuilder::exponential_backoff`]: crate::RetryConfigBuilder::exponential_backoff
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    initial: Duration,
    multiplier: f64,
    max_delay: Duration,
}

impl ExponentialBackoff {
    /// Creates an exponential backoff with `initial` interval, multiplier `2.0`,
    /// and no cap on the maximum delay other than `Duration::MAX`.
    pub fn new(initial: Duration) -> Self {
        Self {
            initial,
            multiplier: 2.0,
            max_delay: Duration::MAX,
        }
    }

    /// Overrides the default `2.0` growth multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Caps the backoff at `max_delay`, before jitter is applied.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_delay(&self, attempt: usize) -> Duration {
        let raw = self.initial.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = raw.min(self.max_delay.as_secs_f64());
        let jitter = rand::rng().random_range(0.5..1.5);
        Duration::from_secs_f64((capped * jitter).max(0.0))
    }
}

/// Equal-jitter exponential backoff: half the computed delay is fixed, the
/// other half is randomized, so the wait never drops to near zero the way
/// full jitter can.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialRandomBackoff {
    initial: Duration,
    multiplier: f64,
    max_delay: Duration,
}

impl ExponentialRandomBackoff {
    /// Creates an equal-jitter exponential backoff with `initial` interval
    /// and multiplier `2.0`.
    pub fn new(initial: Duration) -> Self {
        Self {
            initial,
            multiplier: 2.0,
            max_delay: Duration::MAX,
        }
    }

    /// Overrides the default `2.0` growth multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Caps the backoff at `max_delay`, before jitter is applied.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }
}

impl IntervalFunction for ExponentialRandomBackoff {
    fn next_delay(&self, attempt: usize) -> Duration {
        let raw = self.initial.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = raw.min(self.max_delay.as_secs_f64());
        let half = capped / 2.0;
        let jitter = rand::rng().random_range(0.0..=half);
        Duration::from_secs_f64(half + jitter)
    }
}

/// A user-supplied backoff function.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    /// Wraps `f` as an [`IntervalFunction`].
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_delay(&self, attempt: usize) -> Duration {
        (self.f)(attempt)
    }
}
