//! Error type for the adaptive client.

use resilience_core::ResilienceError;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the adaptive client.
#[derive(Debug, Error)]
pub enum AdaptiveClientError<E> {
    /// `strategy = reject` and the client is currently rate-limited (either
    /// from local cooldown state or a fresh `429` response).
    #[error("rate limited, retry after {retry_after:?} (backpressure {backpressure})")]
    RateLimited {
        /// Advisory wait, parsed from `Retry-After` / `X-RateLimit-Retry-After-Ms`.
        retry_after: Option<Duration>,
        /// Last-seen backpressure score in `[0, 1]`.
        backpressure: f64,
    },

    /// `strategy = queue` and every configured retry still came back `429`.
    #[error("max retries exceeded after {attempts} attempt(s)")]
    MaxRetriesExceeded {
        /// Total number of attempts made, including the initial one.
        attempts: usize,
    },

    /// The inner service's error, passed through unmodified.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> AdaptiveClientError<E> {
    /// Returns `true` if the call was rejected due to active rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AdaptiveClientError::RateLimited { .. })
    }

    /// Returns `true` if the retry budget for `429` responses was exhausted.
    pub fn is_max_retries_exceeded(&self) -> bool {
        matches!(self, AdaptiveClientError::MaxRetriesExceeded { .. })
    }

    /// Returns `true` if this wraps an inner service error.
    pub fn is_inner(&self) -> bool {
        matches!(self, AdaptiveClientError::Inner(_))
    }

    /// Extracts the inner service error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            AdaptiveClientError::Inner(e) => Some(e),
            AdaptiveClientError::RateLimited { .. }
            | AdaptiveClientError::MaxRetriesExceeded { .. } => None,
        }
    }
}

impl<E> From<E> for AdaptiveClientError<E> {
    fn from(err: E) -> Self {
        AdaptiveClientError::Inner(err)
    }
}

impl<E> From<AdaptiveClientError<E>> for ResilienceError<E> {
    fn from(err: AdaptiveClientError<E>) -> Self {
        match err {
            AdaptiveClientError::RateLimited { retry_after, .. } => {
                ResilienceError::RateLimited { retry_after }
            }
            AdaptiveClientError::MaxRetriesExceeded { attempts } => {
                ResilienceError::AttemptsExceeded { attempts }
            }
            AdaptiveClientError::Inner(e) => ResilienceError::Application(e),
        }
    }
}
