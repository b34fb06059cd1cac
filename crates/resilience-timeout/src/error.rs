//! Error types for the timeout pattern.

use resilience_core::ResilienceError;
use thiserror::Error;

/// Errors that can occur when a call passes through a timeout guard.
#[derive(Debug, Error)]
pub enum TimeoutError<E> {
    /// The inner service did not complete before the configured duration elapsed.
    #[error("operation timed out")]
    Timeout,
    /// The inner service returned an error before the timeout elapsed.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> TimeoutError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeoutError::Timeout)
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            TimeoutError::Inner(e) => Some(e),
            TimeoutError::Timeout => None,
        }
    }
}

impl<E> From<E> for TimeoutError<E> {
    fn from(err: E) -> Self {
        TimeoutError::Inner(err)
    }
}

impl<E> From<TimeoutError<E>> for ResilienceError<E> {
    fn from(err: TimeoutError<E>) -> Self {
        match err {
            TimeoutError::Timeout => ResilienceError::Timeout { layer: "timeout" },
            TimeoutError::Inner(e) => ResilienceError::Application(e),
        }
    }
}
