use resilience_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Why the client is suspending a request before (re)sending it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueReason {
    /// Waiting out a `Retry-After` deadline learned from a prior `429`.
    RateLimitCooldown,
    /// Proactively backing off because the last-seen backpressure score
    /// cleared the configured threshold.
    Backpressure,
}

/// Events emitted by the adaptive client.
#[derive(Debug, Clone)]
pub enum AdaptiveClientEvent {
    /// The client is waiting before sending (or resending) a request.
    RequestQueued {
        pattern_name: String,
        timestamp: Instant,
        wait: Duration,
        reason: QueueReason,
    },
    /// A request was rejected outright (`strategy = reject`) instead of queued.
    RequestRejected {
        pattern_name: String,
        timestamp: Instant,
        retry_after: Option<Duration>,
        backpressure: f64,
    },
    /// A fresh backpressure score was observed on a response.
    BackpressureObserved {
        pattern_name: String,
        timestamp: Instant,
        backpressure: f64,
    },
    /// A retry after a `429` is about to be attempted.
    RetryScheduled {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
        wait: Duration,
    },
    /// All configured retries were exhausted following repeated `429`s.
    RetriesExhausted {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
    },
}

impl ResilienceEvent for AdaptiveClientEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AdaptiveClientEvent::RequestQueued { .. } => "RequestQueued",
            AdaptiveClientEvent::RequestRejected { .. } => "RequestRejected",
            AdaptiveClientEvent::BackpressureObserved { .. } => "BackpressureObserved",
            AdaptiveClientEvent::RetryScheduled { .. } => "RetryScheduled",
            AdaptiveClientEvent::RetriesExhausted { .. } => "RetriesExhausted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            AdaptiveClientEvent::RequestQueued { timestamp, .. }
            | AdaptiveClientEvent::RequestRejected { timestamp, .. }
            | AdaptiveClientEvent::BackpressureObserved { timestamp, .. }
            | AdaptiveClientEvent::RetryScheduled { timestamp, .. }
            | AdaptiveClientEvent::RetriesExhausted { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            AdaptiveClientEvent::RequestQueued { pattern_name, .. }
            | AdaptiveClientEvent::RequestRejected { pattern_name, .. }
            | AdaptiveClientEvent::BackpressureObserved { pattern_name, .. }
            | AdaptiveClientEvent::RetryScheduled { pattern_name, .. }
            | AdaptiveClientEvent::RetriesExhausted { pattern_name, .. } => pattern_name,
        }
    }
}
