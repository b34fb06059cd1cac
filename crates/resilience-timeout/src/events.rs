//! Event types for the timeout pattern.

use resilience_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by the timeout pattern.
#[derive(Debug, Clone)]
pub enum TimeoutEvent {
    /// A call finished successfully before the timeout elapsed.
    Success {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
    },
    /// A call finished with an inner error before the timeout elapsed.
    Error {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
    },
    /// A call did not complete within the configured duration and was cancelled.
    Timeout {
        pattern_name: String,
        timestamp: Instant,
        timeout_duration: Duration,
    },
}

impl ResilienceEvent for TimeoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TimeoutEvent::Success { .. } => "success",
            TimeoutEvent::Error { .. } => "error",
            TimeoutEvent::Timeout { .. } => "timeout",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeoutEvent::Success { timestamp, .. }
            | TimeoutEvent::Error { timestamp, .. }
            | TimeoutEvent::Timeout { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            TimeoutEvent::Success { pattern_name, .. }
            | TimeoutEvent::Error { pattern_name, .. }
            | TimeoutEvent::Timeout { pattern_name, .. } => pattern_name,
        }
    }
}
