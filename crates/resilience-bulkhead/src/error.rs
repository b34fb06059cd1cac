//! Error types for the bulkhead pattern.

use resilience_core::ResilienceError;
use thiserror::Error;

/// Errors that can occur when a call passes through a bulkhead.
#[derive(Debug, Error)]
pub enum BulkheadError<E> {
    /// Rejected immediately: both the concurrent-call slots and the wait queue were full.
    #[error("bulkhead is full: {max_concurrent_calls} concurrent calls, {max_queued} queued")]
    BulkheadFull {
        max_concurrent_calls: usize,
        max_queued: usize,
    },
    /// A queued call exceeded `max_wait_duration` before a slot freed up.
    #[error("timed out waiting for a bulkhead permit")]
    Timeout,
    /// The inner service returned an error.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> BulkheadError<E> {
    pub fn is_bulkhead_full(&self) -> bool {
        matches!(self, BulkheadError::BulkheadFull { .. })
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            BulkheadError::Inner(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<E> for BulkheadError<E> {
    fn from(err: E) -> Self {
        BulkheadError::Inner(err)
    }
}

impl<E> From<BulkheadError<E>> for ResilienceError<E> {
    fn from(err: BulkheadError<E>) -> Self {
        match err {
            BulkheadError::BulkheadFull {
                max_concurrent_calls,
                max_queued,
            } => ResilienceError::BulkheadFull {
                in_flight: max_concurrent_calls + max_queued,
                max_concurrent: max_concurrent_calls,
            },
            BulkheadError::Timeout => ResilienceError::Timeout { layer: "bulkhead" },
            BulkheadError::Inner(e) => ResilienceError::Application(e),
        }
    }
}
