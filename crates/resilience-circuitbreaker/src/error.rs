use resilience_core::ResilienceError;
use thiserror::Error;

/// Errors returned by the `CircuitBreaker` service.
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open (or half-open with no permits left); calls are not permitted.
    #[error("circuit breaker '{name:?}' is open")]
    CircuitOpen {
        /// Breaker name, if one was configured.
        name: Option<String>,
    },

    /// An error returned by the inner service.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    /// Returns true if the error indicates the circuit is open.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::CircuitOpen { .. })
    }

    /// Returns the inner error if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Inner(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<E> for CircuitBreakerError<E> {
    fn from(err: E) -> Self {
        CircuitBreakerError::Inner(err)
    }
}

impl<E> From<CircuitBreakerError<E>> for ResilienceError<E> {
    fn from(err: CircuitBreakerError<E>) -> Self {
        match err {
            CircuitBreakerError::CircuitOpen { name } => ResilienceError::CircuitOpen { name },
            CircuitBreakerError::Inner(e) => ResilienceError::Application(e),
        }
    }
}
