//! Error type for the retry middleware.

use resilience_core::ResilienceError;
use thiserror::Error;

/// Errors produced by the retry layer.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All configured attempts were exhausted without success.
    #[error("retry attempts exhausted after {attempts} attempt(s)")]
    AttemptsExceeded {
        /// Total number of attempts made, including the initial one.
        attempts: usize,
        /// The error returned by the final attempt.
        source: E,
    },

    /// The inner service's error, passed through unretried.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> RetryError<E> {
    /// Returns `true` if this error represents attempt-budget exhaustion.
    pub fn is_attempts_exceeded(&self) -> bool {
        matches!(self, RetryError::AttemptsExceeded { .. })
    }

    /// Unwraps the underlying application error, if any.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::AttemptsExceeded { source, .. } => source,
            RetryError::Inner(source) => source,
        }
    }
}

impl<E> From<E> for RetryError<E> {
    fn from(err: E) -> Self {
        RetryError::Inner(err)
    }
}

impl<E> From<RetryError<E>> for ResilienceError<E> {
    fn from(err: RetryError<E>) -> Self {
        match err {
            RetryError::AttemptsExceeded { attempts, .. } => {
                ResilienceError::AttemptsExceeded { attempts }
            }
            RetryError::Inner(e) => ResilienceError::Application(e),
        }
    }
}
