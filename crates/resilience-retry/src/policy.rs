//! The retry predicate and the backoff/predicate pairing used by a retry layer.

use crate::backoff::IntervalFunction;
use std::sync::Arc;
use std::time::Duration;

/// A predicate deciding whether a given error is worth retrying.
///
/// Defaults to "retry everything" when not overridden via
/// [`RetryConfigBuilder::retry_on`](crate::RetryConfigBuilder::retry_on).
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Couples a backoff strategy with the predicate that decides whether an
/// error is retryable at all.
pub struct RetryPolicy<E> {
    interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) retry_predicate: Option<RetryPredicate<E>>,
}

impl<E> RetryPolicy<E> {
    /// Creates a policy that retries every error, backed by `interval_fn`.
    pub fn new(interval_fn: Arc<dyn IntervalFunction>) -> Self {
        Self {
            interval_fn,
            retry_predicate: None,
        }
    }

    /// Returns `true` if `error` should trigger a retry.
    ///
    /// With no predicate configured, every error is retryable.
    pub fn should_retry(&self, error: &E) -> bool {
        match &self.retry_predicate {
            Some(predicate) => predicate(error),
            None => true,
        }
    }

    /// Returns the delay to wait before the attempt numbered `attempt`
    /// (zero-indexed, where `0` is the delay before the first retry).
    pub fn next_backoff(&self, attempt: usize) -> Duration {
        self.interval_fn.next_delay(attempt)
    }
}
