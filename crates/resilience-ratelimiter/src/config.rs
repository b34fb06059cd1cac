use crate::bucket::{RetryAfterParams, RetryAfterStrategy};
use crate::events::RateLimiterEvent;
use crate::window::DEFAULT_WINDOW_SIZE;
use resilience_core::events::{EventListeners, FnListener};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Default LRU cap on the number of tracked per-client sub-buckets.
pub const DEFAULT_MAX_TRACKED_CLIENTS: usize = 10_000;

/// Function that extracts a client identifier from a request, for per-client tracking.
pub type ClientKeyExtractor<Req> = Arc<dyn Fn(&Req) -> Option<String> + Send + Sync>;

/// Configuration for the token-bucket rate limiter pattern.
pub struct RateLimiterConfig<Req> {
    pub(crate) max_executions: u64,
    pub(crate) per_time_secs: f64,
    pub(crate) bucket_size: f64,
    pub(crate) client_key_extractor: Option<ClientKeyExtractor<Req>>,
    pub(crate) max_tracked_clients: usize,
    pub(crate) retry_after_strategy: RetryAfterStrategy,
    pub(crate) retry_after_params: RetryAfterParams,
    pub(crate) window_size: usize,
    pub(crate) p95_baseline: f64,
    pub(crate) min_latency: f64,
    pub(crate) min_samples: usize,
    pub(crate) gradient_sensitivity: f64,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) name: String,
}

impl<Req> RateLimiterConfig<Req> {
    /// Starts building a new [`RateLimiterConfig`].
    pub fn builder() -> RateLimiterConfigBuilder<Req> {
        RateLimiterConfigBuilder::new()
    }

    /// Refill rate in tokens per second, derived from `max_executions / per_time_secs`.
    pub fn refill_rate(&self) -> f64 {
        self.max_executions as f64 / self.per_time_secs
    }

    /// Whether per-client sub-buckets are tracked.
    pub fn per_client_tracking_enabled(&self) -> bool {
        self.client_key_extractor.is_some()
    }
}

/// Builder for [`RateLimiterConfig`].
pub struct RateLimiterConfigBuilder<Req> {
    max_executions: u64,
    per_time_secs: f64,
    bucket_size: Option<f64>,
    client_key_extractor: Option<ClientKeyExtractor<Req>>,
    max_tracked_clients: usize,
    retry_after_strategy: RetryAfterStrategy,
    retry_after_params: RetryAfterParams,
    window_size: usize,
    p95_baseline: f64,
    min_latency: f64,
    min_samples: usize,
    gradient_sensitivity: f64,
    event_listeners: EventListeners<RateLimiterEvent>,
    name: String,
    _marker: PhantomData<fn(&Req)>,
}

impl<Req> Default for RateLimiterConfigBuilder<Req> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req> RateLimiterConfigBuilder<Req> {
    /// Creates a new builder with defaults.
    ///
    /// Defaults: 50 executions per second, burst capacity equal to
    /// `max_executions`, per-client tracking disabled, `fixed` retry-after
    /// strategy.
    pub fn new() -> Self {
        Self {
            max_executions: 50,
            per_time_secs: 1.0,
            bucket_size: None,
            client_key_extractor: None,
            max_tracked_clients: DEFAULT_MAX_TRACKED_CLIENTS,
            retry_after_strategy: RetryAfterStrategy::default(),
            retry_after_params: RetryAfterParams::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            p95_baseline: 0.1,
            min_latency: 0.01,
            min_samples: 1,
            gradient_sensitivity: 1.0,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
            _marker: PhantomData,
        }
    }

    /// Sets the number of executions allowed per `per_time_secs` window.
    pub fn max_executions(mut self, max_executions: u64) -> Self {
        self.max_executions = max_executions;
        self
    }

    /// Sets the length of the period `max_executions` is measured over, in seconds.
    pub fn per_time_secs(mut self, per_time_secs: f64) -> Self {
        self.per_time_secs = per_time_secs;
        self
    }

    /// Sets the burst capacity. Defaults to `max_executions`.
    pub fn bucket_size(mut self, bucket_size: u64) -> Self {
        self.bucket_size = Some(bucket_size as f64);
        self
    }

    /// Enables tracking a separate sub-bucket per client id, keyed by the given extractor.
    ///
    /// A global bucket is always debited as well; admission requires both
    /// the global and the client bucket to have a token available. A
    /// `None` return from the extractor falls back to global-only admission
    /// for that request.
    pub fn client_key<F>(mut self, f: F) -> Self
    where
        F: Fn(&Req) -> Option<String> + Send + Sync + 'static,
    {
        self.client_key_extractor = Some(Arc::new(f));
        self
    }

    /// Sets the LRU cap on tracked client sub-buckets.
    pub fn max_tracked_clients(mut self, max: usize) -> Self {
        self.max_tracked_clients = max;
        self
    }

    /// Sets the `Retry-After` computation strategy.
    pub fn retry_after_strategy(mut self, strategy: RetryAfterStrategy) -> Self {
        self.retry_after_strategy = strategy;
        self
    }

    /// Sets the floor and scale used by the `utilization` and `backpressure` strategies.
    pub fn retry_after_params(mut self, min_retry_delay: f64, max_retry_penalty: f64) -> Self {
        self.retry_after_params = RetryAfterParams {
            min_retry_delay,
            max_retry_penalty,
        };
        self
    }

    /// Sets the number of latency samples retained for backpressure scoring.
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Sets the initial P95 latency baseline.
    pub fn p95_baseline(mut self, p95_baseline: f64) -> Self {
        self.p95_baseline = p95_baseline;
        self
    }

    /// Sets the floor latency used by the backpressure gradient component.
    pub fn min_latency(mut self, min_latency: f64) -> Self {
        self.min_latency = min_latency;
        self
    }

    /// Sets the minimum window sample count before backpressure scoring activates.
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Sets the sensitivity of the backpressure gradient component.
    pub fn gradient_sensitivity(mut self, sensitivity: f64) -> Self {
        self.gradient_sensitivity = sensitivity;
        self
    }

    /// Sets the name for this rate limiter instance (used in events and the control plane).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked whenever a permit is acquired.
    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&str>, f64) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::PermitAcquired {
                client_id,
                backpressure,
                ..
            } = event
            {
                f(client_id.as_deref(), *backpressure);
            }
        }));
        self
    }

    /// Registers a callback invoked whenever a permit is rejected.
    pub fn on_permit_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&str>, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::PermitRejected {
                client_id,
                retry_after,
                ..
            } = event
            {
                f(client_id.as_deref(), *retry_after);
            }
        }));
        self
    }

    /// Builds the rate limiter layer.
    pub fn build(self) -> crate::RateLimiterLayer<Req> {
        let bucket_size = self.bucket_size.unwrap_or(self.max_executions as f64);
        let config = RateLimiterConfig {
            max_executions: self.max_executions,
            per_time_secs: self.per_time_secs,
            bucket_size,
            client_key_extractor: self.client_key_extractor,
            max_tracked_clients: self.max_tracked_clients,
            retry_after_strategy: self.retry_after_strategy,
            retry_after_params: self.retry_after_params,
            window_size: self.window_size,
            p95_baseline: self.p95_baseline,
            min_latency: self.min_latency,
            min_samples: self.min_samples,
            gradient_sensitivity: self.gradient_sensitivity,
            event_listeners: self.event_listeners,
            name: self.name,
        };

        crate::RateLimiterLayer::new(config)
    }
}
