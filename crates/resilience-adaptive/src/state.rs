//! Shared client-side backpressure state.

use std::time::Instant;

/// The last-observed server backpressure signals for one adaptive client.
///
/// A single `AdaptiveClient` and all its clones share one `AdaptiveState`
/// behind a mutex, so backpressure learned on one call informs the next
/// call made through any clone.
#[derive(Debug, Clone, Default)]
pub(crate) struct AdaptiveState {
    pub(crate) is_rate_limited: bool,
    pub(crate) retry_after_deadline: Option<Instant>,
    pub(crate) backpressure: f64,
    pub(crate) remaining_tokens: Option<u64>,
}

impl AdaptiveState {
    pub(crate) fn observe_429(&mut self, retry_after_deadline: Instant, backpressure: f64, remaining_tokens: Option<u64>) {
        self.is_rate_limited = true;
        self.retry_after_deadline = Some(retry_after_deadline);
        self.backpressure = backpressure;
        self.remaining_tokens = remaining_tokens;
    }

    pub(crate) fn observe_2xx(&mut self, backpressure: Option<f64>, remaining_tokens: Option<u64>) {
        self.is_rate_limited = false;
        self.retry_after_deadline = None;
        if let Some(bp) = backpressure {
            self.backpressure = bp;
        }
        if remaining_tokens.is_some() {
            self.remaining_tokens = remaining_tokens;
        }
    }
}
