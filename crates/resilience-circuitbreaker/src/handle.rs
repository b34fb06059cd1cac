//! [`ComponentHandle`] integration, gated behind the `controlplane` feature.

use crate::{CircuitBreaker, CircuitState};
use resilience_controlplane::{ComponentHandle, ControlPlaneError};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Registers a [`CircuitBreaker`] with a [`Registry`](resilience_controlplane::Registry).
///
/// Shares the breaker's own gate bit rather than holding a second one, so
/// `POST /control/circuitbreaker/:name/disable` and
/// [`CircuitBreaker::disable`] observe and affect the exact same state.
pub struct CircuitBreakerHandle {
    name: String,
    enabled: Arc<AtomicBool>,
    state: Arc<dyn Fn() -> CircuitState + Send + Sync>,
    failure_threshold: usize,
    recovery_timeout_ms: u64,
    half_open_requests: usize,
}

impl CircuitBreakerHandle {
    /// Builds a handle sharing `breaker`'s enable/disable gate.
    ///
    /// `name` is the instance name reported to the registry; it need not
    /// match the breaker's own `name()` config field.
    pub fn new<S, C>(name: impl Into<String>, breaker: &CircuitBreaker<S, C>) -> Self
    where
        S: Clone + Send + Sync + 'static,
        C: Send + Sync + 'static,
    {
        let state_breaker = breaker.clone();
        Self {
            name: name.into(),
            enabled: breaker.enabled_handle(),
            state: Arc::new(move || state_breaker.state_sync()),
            failure_threshold: breaker.config.failure_threshold,
            recovery_timeout_ms: breaker.config.recovery_timeout.as_millis() as u64,
            half_open_requests: breaker.config.half_open_requests,
        }
    }
}

impl ComponentHandle for CircuitBreakerHandle {
    fn kind(&self) -> &str {
        "circuitbreaker"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn config(&self) -> Value {
        json!({
            "failure_threshold": self.failure_threshold,
            "recovery_timeout_ms": self.recovery_timeout_ms,
            "half_open_requests": self.half_open_requests,
        })
    }

    fn update_config(&self, patch: Value) -> Result<(), ControlPlaneError> {
        match patch.as_object() {
            Some(fields) if fields.is_empty() => Ok(()),
            Some(fields) => {
                let field = fields.keys().next().cloned().unwrap_or_default();
                Err(ControlPlaneError::UnknownConfigField { field })
            }
            None => Err(ControlPlaneError::InvalidConfigValue {
                field: "<root>".to_string(),
                reason: "expected a JSON object".to_string(),
            }),
        }
    }

    fn metrics(&self) -> Value {
        let state = (self.state)();
        json!({
            "state": match state {
                CircuitState::Closed => "closed",
                CircuitState::Open => "open",
                CircuitState::HalfOpen => "half_open",
            },
        })
    }

    fn reset_metrics(&self) {}
}
