//! Error types for the hedging middleware.

use resilience_core::ResilienceError;
use std::fmt;

/// Error type for the hedging service.
#[derive(Debug, Clone)]
pub enum HedgeError<E> {
    /// All hedged attempts failed.
    ///
    /// Contains the error from the primary request.
    AllAttemptsFailed(E),

    /// The overall hedge budget elapsed before any attempt succeeded.
    Timeout,

    /// Error from the inner service.
    Inner(E),
}

impl<E: fmt::Display> fmt::Display for HedgeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HedgeError::AllAttemptsFailed(e) => {
                write!(f, "all hedged attempts failed: {}", e)
            }
            HedgeError::Timeout => write!(f, "hedge timed out with no success"),
            HedgeError::Inner(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for HedgeError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HedgeError::AllAttemptsFailed(e) => Some(e),
            HedgeError::Timeout => None,
            HedgeError::Inner(e) => Some(e),
        }
    }
}

impl<E> HedgeError<E> {
    /// Returns `true` if all hedged attempts failed.
    pub fn is_all_attempts_failed(&self) -> bool {
        matches!(self, HedgeError::AllAttemptsFailed(_))
    }

    /// Returns `true` if the overall hedge budget elapsed with no success.
    pub fn is_timeout(&self) -> bool {
        matches!(self, HedgeError::Timeout)
    }

    /// Returns `true` if this is an inner service error.
    pub fn is_inner(&self) -> bool {
        matches!(self, HedgeError::Inner(_))
    }

    /// Get a reference to the inner error, if any.
    pub fn inner(&self) -> Option<&E> {
        match self {
            HedgeError::AllAttemptsFailed(e) | HedgeError::Inner(e) => Some(e),
            HedgeError::Timeout => None,
        }
    }

    /// Convert into the inner error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            HedgeError::AllAttemptsFailed(e) | HedgeError::Inner(e) => Some(e),
            HedgeError::Timeout => None,
        }
    }
}

impl<E> From<HedgeError<E>> for ResilienceError<E> {
    fn from(err: HedgeError<E>) -> Self {
        match err {
            HedgeError::Timeout => ResilienceError::HedgeTimeout,
            HedgeError::AllAttemptsFailed(e) | HedgeError::Inner(e) => {
                ResilienceError::Application(e)
            }
        }
    }
}
