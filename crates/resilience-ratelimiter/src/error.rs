use resilience_core::ResilienceError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the `RateLimiter` service.
#[derive(Debug, Error)]
pub enum RateLimiterError<E> {
    /// No token was available, globally or for the calling client.
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimitExceeded {
        /// Advisory delay before retrying, per the configured strategy.
        retry_after: Duration,
    },

    /// An error returned by the inner service.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> RateLimiterError<E> {
    /// Returns true if the call was rejected for lack of a token.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RateLimiterError::RateLimitExceeded { .. })
    }

    /// The advisory retry delay, if this is a `RateLimitExceeded`.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RateLimiterError::RateLimitExceeded { retry_after } => Some(*retry_after),
            RateLimiterError::Inner(_) => None,
        }
    }

    /// Returns the inner error, if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            RateLimiterError::Inner(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<RateLimiterError<E>> for ResilienceError<E> {
    fn from(err: RateLimiterError<E>) -> Self {
        match err {
            RateLimiterError::RateLimitExceeded { retry_after } => ResilienceError::RateLimited {
                retry_after: Some(retry_after),
            },
            RateLimiterError::Inner(e) => ResilienceError::Application(e),
        }
    }
}
