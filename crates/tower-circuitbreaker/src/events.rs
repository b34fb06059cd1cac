use crate::CircuitState;
use std::time::Instant;
use tower_resilience_core::ResilienceEvent;

/// Events emitted by the circuit breaker pattern.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// A call was permitted through the circuit breaker.
    CallPermitted {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call was rejected because the circuit is open.
    CallRejected {
        pattern_name: String,
        timestamp: Instant,
    },
    /// The circuit breaker transitioned between states.
    StateTransition {
        pattern_name: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A successful call was recorded.
    SuccessRecorded {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A failed call was recorded.
    FailureRecorded {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            CircuitBreakerEvent::CallPermitted { pattern_name, .. }
            | CircuitBreakerEvent::CallRejected { pattern_name, .. }
            | CircuitBreakerEvent::StateTransition { pattern_name, .. }
            | CircuitBreakerEvent::SuccessRecorded { pattern_name, .. }
            | CircuitBreakerEvent::FailureRecorded { pattern_name, .. } => pattern_name,
        }
    }
}
