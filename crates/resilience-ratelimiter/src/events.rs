//! Event types for the rate limiter pattern.

use resilience_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by the rate limiter pattern.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A token was acquired, globally and (if tracked) for the client.
    PermitAcquired {
        /// Name of the rate limiter instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Client identifier, if per-client tracking is enabled.
        client_id: Option<String>,
        /// Backpressure score at the time of acquisition.
        backpressure: f64,
    },
    /// A token could not be acquired.
    PermitRejected {
        /// Name of the rate limiter instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Client identifier, if per-client tracking is enabled.
        client_id: Option<String>,
        /// Advisory delay before retrying.
        retry_after: Duration,
    },
    /// The backpressure baseline was adapted from a completed latency window.
    BaselineAdapted {
        /// Name of the rate limiter instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// New P95 baseline after the EMA update.
        new_baseline: f64,
    },
}

impl ResilienceEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::PermitAcquired { .. } => "permit_acquired",
            RateLimiterEvent::PermitRejected { .. } => "permit_rejected",
            RateLimiterEvent::BaselineAdapted { .. } => "baseline_adapted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::PermitAcquired { timestamp, .. }
            | RateLimiterEvent::PermitRejected { timestamp, .. }
            | RateLimiterEvent::BaselineAdapted { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RateLimiterEvent::PermitAcquired { pattern_name, .. }
            | RateLimiterEvent::PermitRejected { pattern_name, .. }
            | RateLimiterEvent::BaselineAdapted { pattern_name, .. } => pattern_name,
        }
    }
}
