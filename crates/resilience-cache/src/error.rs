//! Error types for cache.

use std::fmt;

/// Errors that can occur in the cache.
#[derive(Debug)]
pub enum CacheError<E> {
    /// The inner service returned an error.
    Inner(E),
    /// The request leading this key's computation was dropped (e.g. by an
    /// outer cancellation or timeout) before it completed. Waiters that had
    /// joined it have no result to share and must retry.
    LeaderDropped,
}

impl<E: Clone> Clone for CacheError<E> {
    fn clone(&self) -> Self {
        match self {
            CacheError::Inner(e) => CacheError::Inner(e.clone()),
            CacheError::LeaderDropped => CacheError::LeaderDropped,
        }
    }
}

impl<E: fmt::Display> fmt::Display for CacheError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Inner(e) => write!(f, "inner service error: {}", e),
            CacheError::LeaderDropped => {
                write!(f, "the in-flight computation for this key was dropped")
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CacheError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Inner(e) => Some(e),
            CacheError::LeaderDropped => None,
        }
    }
}

impl<E> CacheError<E> {
    /// Returns `true` if this is a [`CacheError::LeaderDropped`].
    pub fn is_leader_dropped(&self) -> bool {
        matches!(self, CacheError::LeaderDropped)
    }

    /// Converts this error into the inner error, if there is one.
    pub fn into_inner(self) -> Option<E> {
        match self {
            CacheError::Inner(e) => Some(e),
            CacheError::LeaderDropped => None,
        }
    }
}

impl<E> From<CacheError<E>> for resilience_core::ResilienceError<E> {
    fn from(err: CacheError<E>) -> Self {
        match err {
            CacheError::Inner(e) => resilience_core::ResilienceError::Application(e),
            // No dedicated variant exists for this case; a dropped leader
            // leaves the waiter with nothing to show for the wait, which is
            // the same shape of failure as a timeout from the caller's side.
            CacheError::LeaderDropped => {
                resilience_core::ResilienceError::Timeout { layer: "cache" }
            }
        }
    }
}
