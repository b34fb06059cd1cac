use crate::events::AdaptiveClientEvent;
use resilience_core::events::{EventListeners, FnListener};
use resilience_core::{Clock, RealClock};
use std::sync::Arc;
use std::time::Duration;

/// What to do while the client believes the server is rate-limiting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Sleep out the cooldown (or backpressure delay) and send anyway.
    Queue,
    /// Fail immediately with [`crate::AdaptiveClientError::RateLimited`].
    Reject,
}

/// Configuration for the adaptive client.
pub struct AdaptiveClientConfig {
    pub(crate) strategy: Strategy,
    pub(crate) max_retries: usize,
    pub(crate) backoff_multiplier: f64,
    pub(crate) respect_backpressure: bool,
    pub(crate) backpressure_threshold: f64,
    pub(crate) max_wait: Duration,
    pub(crate) name: String,
    pub(crate) listeners: EventListeners<AdaptiveClientEvent>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Default for AdaptiveClientConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Queue,
            max_retries: 3,
            backoff_multiplier: 2.0,
            respect_backpressure: true,
            backpressure_threshold: 0.7,
            max_wait: Duration::from_secs(30),
            name: "<unnamed>".to_string(),
            listeners: EventListeners::new(),
            clock: Arc::new(RealClock),
        }
    }
}

/// Builder for [`AdaptiveClientConfig`].
#[derive(Default)]
pub struct AdaptiveClientConfigBuilder {
    config: AdaptiveClientConfig,
}

impl AdaptiveClientConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - strategy: `Queue`
    /// - max_retries: 3
    /// - backoff_multiplier: 2.0
    /// - respect_backpressure: true, threshold 0.7
    /// - max_wait: 30s
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategy used while rate-limited or over the backpressure threshold.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Shorthand for `.strategy(Strategy::Queue)`.
    pub fn queue(self) -> Self {
        self.strategy(Strategy::Queue)
    }

    /// Shorthand for `.strategy(Strategy::Reject)`.
    pub fn reject(self) -> Self {
        self.strategy(Strategy::Reject)
    }

    /// Sets the maximum number of `429`-triggered retries (`strategy = Queue` only).
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Sets the multiplier applied to the wait on each successive `429`.
    pub fn backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.config.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Enables or disables proactive waiting when backpressure clears the threshold.
    pub fn respect_backpressure(mut self, respect: bool) -> Self {
        self.config.respect_backpressure = respect;
        self
    }

    /// Sets the backpressure score (`[0, 1]`) above which the client proactively waits.
    pub fn backpressure_threshold(mut self, threshold: f64) -> Self {
        self.config.backpressure_threshold = threshold;
        self
    }

    /// Sets the ceiling on any single wait, whether from a `Retry-After` deadline
    /// or from proactive backpressure throttling.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.config.max_wait = max_wait;
        self
    }

    /// Sets the name for this client instance (used in events).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.name = name.into();
        self
    }

    /// Injects a custom clock, primarily for deterministic tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.config.clock = clock;
        self
    }

    /// Registers a callback fired whenever the client waits before sending.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - the wait duration.
    pub fn on_queued<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.config.listeners.add(FnListener::new(move |event| {
            if let AdaptiveClientEvent::RequestQueued { wait, .. } = event {
                f(*wait);
            }
        }));
        self
    }

    /// Registers a callback fired when a request is rejected instead of queued.
    ///
    /// # Callback Signature
    /// `Fn(Option<Duration>, f64)` - the advertised retry-after and backpressure.
    pub fn on_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<Duration>, f64) + Send + Sync + 'static,
    {
        self.config.listeners.add(FnListener::new(move |event| {
            if let AdaptiveClientEvent::RequestRejected {
                retry_after,
                backpressure,
                ..
            } = event
            {
                f(*retry_after, *backpressure);
            }
        }));
        self
    }

    /// Builds the adaptive client layer.
    pub fn build(self) -> crate::AdaptiveClientLayer {
        crate::AdaptiveClientLayer::new(self.config)
    }
}
