//! The token-bucket primitive and its pluggable `Retry-After` strategies.

use rand::Rng;
use std::time::{Duration, Instant};

/// Strategy used to compute the advisory `Retry-After` delay on rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAfterStrategy {
    /// Time until the next full token is available.
    Fixed,
    /// Linear penalty scaled by how drained the bucket is.
    Utilization,
    /// `Fixed` plus a penalty scaled by the backpressure score, jittered.
    Backpressure,
}

impl Default for RetryAfterStrategy {
    fn default() -> Self {
        Self::Fixed
    }
}

/// Parameters shared by every `Retry-After` formula.
#[derive(Debug, Clone, Copy)]
pub struct RetryAfterParams {
    /// Floor applied to every computed delay.
    pub min_retry_delay: f64,
    /// Scale of the penalty term added on top of the floor.
    pub max_retry_penalty: f64,
}

impl Default for RetryAfterParams {
    fn default() -> Self {
        Self {
            min_retry_delay: 0.0,
            max_retry_penalty: 1.0,
        }
    }
}

/// A single token bucket: either the global bucket or one client's sub-bucket.
///
/// Refill is lazy: tokens are topped up on every acquisition attempt based on
/// elapsed time since the last refill, never by a background task. This makes
/// refill idempotent regardless of how often (or rarely) `refill` is called.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    bucket_size: f64,
    refill_rate: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket with the given capacity and refill rate (tokens/second).
    pub fn new(bucket_size: f64, refill_rate: f64, now: Instant) -> Self {
        Self {
            bucket_size,
            refill_rate,
            tokens: bucket_size,
            last_refill: now,
        }
    }

    /// Tops up `tokens` for elapsed time since the last refill, capped at `bucket_size`.
    pub fn refill(&mut self, now: Instant) {
        let delta = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + delta * self.refill_rate).min(self.bucket_size);
        self.last_refill = now;
    }

    /// Whether a token is currently available (call `refill` first).
    pub fn has_token(&self) -> bool {
        self.tokens >= 1.0
    }

    /// Debits exactly one token. Caller must have checked `has_token` first.
    pub fn debit(&mut self) {
        self.tokens -= 1.0;
    }

    /// Current token count, possibly fractional.
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Current token count, floored, for `RateLimit-Remaining` reporting.
    pub fn remaining(&self) -> u64 {
        self.tokens.floor().max(0.0) as u64
    }

    /// Computes the advisory retry-after delay for the given strategy.
    ///
    /// `backpressure` is only consulted by [`RetryAfterStrategy::Backpressure`].
    pub fn retry_after(
        &self,
        strategy: RetryAfterStrategy,
        params: RetryAfterParams,
        backpressure: f64,
    ) -> Duration {
        let secs = match strategy {
            RetryAfterStrategy::Fixed => self.time_to_next_token(),
            RetryAfterStrategy::Utilization => {
                let drained_fraction = 1.0 - (self.tokens / self.bucket_size).clamp(0.0, 1.0);
                params.min_retry_delay + params.max_retry_penalty * drained_fraction
            }
            RetryAfterStrategy::Backpressure => {
                let base = self.time_to_next_token();
                let penalty = params.max_retry_penalty * backpressure;
                let floor = params.min_retry_delay.max(base + penalty);
                let jitter = rand::rng().random_range(0.8..=1.2);
                floor * jitter
            }
        };
        Duration::from_secs_f64(secs.max(0.0))
    }

    fn time_to_next_token(&self) -> f64 {
        if self.refill_rate <= 0.0 {
            return f64::INFINITY;
        }
        ((1.0 - self.tokens) / self.refill_rate).max(0.0)
    }
}
