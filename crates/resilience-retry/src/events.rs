use resilience_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by the retry middleware.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A retry attempt is about to be made.
    Retry {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    /// The operation succeeded (either on first try or after retries).
    Success {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The operation failed after exhausting all retry attempts.
    AttemptsExceeded {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// An error occurred but was not retried (filtered by retry predicate).
    IgnoredError {
        pattern_name: String,
        timestamp: Instant,
    },
    /// A retry was skipped because the retry budget was exhausted.
    BudgetExhausted {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
    },
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "Retry",
            RetryEvent::Success { .. } => "Success",
            RetryEvent::AttemptsExceeded { .. } => "AttemptsExceeded",
            RetryEvent::IgnoredError { .. } => "IgnoredError",
            RetryEvent::BudgetExhausted { .. } => "BudgetExhausted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::AttemptsExceeded { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. }
            | RetryEvent::BudgetExhausted { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RetryEvent::Retry { pattern_name, .. }
            | RetryEvent::Success { pattern_name, .. }
            | RetryEvent::AttemptsExceeded { pattern_name, .. }
            | RetryEvent::IgnoredError { pattern_name, .. }
            | RetryEvent::BudgetExhausted { pattern_name, .. } => pattern_name,
        }
    }
}
