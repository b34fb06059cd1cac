//! Event types for the bulkhead pattern.

use resilience_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by the bulkhead pattern.
#[derive(Debug, Clone)]
pub enum BulkheadEvent {
    /// A call entered the wait queue because all concurrent slots were taken.
    CallQueued {
        pattern_name: String,
        timestamp: Instant,
        queued_calls: usize,
    },
    /// A call was permitted through the bulkhead, either immediately or after queueing.
    CallPermitted {
        pattern_name: String,
        timestamp: Instant,
        concurrent_calls: usize,
    },
    /// A call was rejected because both the concurrent-call slots and the wait queue are full.
    CallRejected {
        pattern_name: String,
        timestamp: Instant,
        max_concurrent_calls: usize,
    },
    /// A call finished successfully.
    CallFinished {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
    },
    /// A call finished with an error.
    CallFailed {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
    },
}

impl ResilienceEvent for BulkheadEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BulkheadEvent::CallQueued { .. } => "call_queued",
            BulkheadEvent::CallPermitted { .. } => "call_permitted",
            BulkheadEvent::CallRejected { .. } => "call_rejected",
            BulkheadEvent::CallFinished { .. } => "call_finished",
            BulkheadEvent::CallFailed { .. } => "call_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BulkheadEvent::CallQueued { timestamp, .. }
            | BulkheadEvent::CallPermitted { timestamp, .. }
            | BulkheadEvent::CallRejected { timestamp, .. }
            | BulkheadEvent::CallFinished { timestamp, .. }
            | BulkheadEvent::CallFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            BulkheadEvent::CallQueued { pattern_name, .. }
            | BulkheadEvent::CallPermitted { pattern_name, .. }
            | BulkheadEvent::CallRejected { pattern_name, .. }
            | BulkheadEvent::CallFinished { pattern_name, .. }
            | BulkheadEvent::CallFailed { pattern_name, .. } => pattern_name,
        }
    }
}
