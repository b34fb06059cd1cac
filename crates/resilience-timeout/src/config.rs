//! Configuration for the timeout pattern.

use crate::events::TimeoutEvent;
use resilience_core::events::{EventListeners, FnListener};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Source for determining timeout duration.
///
/// This enum allows configuring either a fixed timeout for all requests
/// or a dynamic timeout extracted from each request.
#[derive(Clone)]
pub enum TimeoutSource<Req> {
    /// Fixed timeout duration for all requests.
    Fixed(Duration),
    /// Dynamic timeout extracted from the request.
    ///
    /// The function receives a reference to the request and returns
    /// the timeout duration to use for that specific request.
    Dynamic(Arc<dyn Fn(&Req) -> Duration + Send + Sync>),
}

impl<Req> TimeoutSource<Req> {
    /// Get the timeout duration for a request.
    pub fn get_timeout(&self, req: &Req) -> Duration {
        match self {
            TimeoutSource::Fixed(d) => *d,
            TimeoutSource::Dynamic(f) => f(req),
        }
    }
}

impl<Req> Default for TimeoutSource<Req> {
    fn default() -> Self {
        TimeoutSource::Fixed(Duration::from_secs(5))
    }
}

/// Configuration for the timeout pattern.
pub struct TimeoutConfig<Req> {
    pub(crate) timeout_source: TimeoutSource<Req>,
    pub(crate) event_listeners: EventListeners<TimeoutEvent>,
    pub(crate) name: String,
}

/// Builder for configuring and constructing a timeout layer.
pub struct TimeoutConfigBuilder<Req> {
    timeout_source: TimeoutSource<Req>,
    event_listeners: EventListeners<TimeoutEvent>,
    name: String,
    _phantom: PhantomData<Req>,
}

impl<Req> TimeoutConfigBuilder<Req> {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            timeout_source: TimeoutSource::default(),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
            _phantom: PhantomData,
        }
    }

    /// Sets a fixed timeout duration for all requests.
    ///
    /// This is the simplest configuration where every request gets
    /// the same timeout.
    ///
    /// Default: 5 seconds
    ///
    /// # Example
    ///
    /// ```rust
    /// use resilience_timeout::TimeoutLayer;
    /// use std::time::Duration;
    ///
    /// let layer = TimeoutLayer::<()>::builder()
    ///     .timeout_duration(Duration::from_secs(30))
    ///     .build();
    /// ```
    pub fn timeout_duration(mut self, duration: Duration) -> Self {
        self.timeout_source = TimeoutSource::Fixed(duration);
        self
    }

    /// Sets a dynamic timeout extractor function.
    ///
    /// The function receives a reference to the request and returns
    /// the timeout duration to use for that specific request. This
    /// enables per-request timeouts based on request properties.
    ///
    /// # Use Cases
    ///
    /// - Extract timeout from HTTP headers (e.g., `X-Timeout-Ms`)
    /// - Honor gRPC deadline propagation
    /// - Different SLAs for different operations
    /// - Priority-based timeout budgets
    ///
    /// # Example
    ///
    /// ```rust
    /// use resilience_timeout::TimeoutLayer;
    /// use std::time::Duration;
    ///
    /// #[derive(Clone)]
    /// struct MyRequest {
    ///     timeout_ms: Option<u64>,
    ///     // ... other fields
    /// }
    ///
    /// let layer = TimeoutLayer::<MyRequest>::builder()
    ///     .timeout_fn(|req: &MyRequest| {
    ///         req.timeout_ms
    ///             .map(Duration::from_millis)
    ///             .unwrap_or(Duration::from_secs(5))
    ///     })
    ///     .build();
    /// ```
    pub fn timeout_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Req) -> Duration + Send + Sync + 'static,
    {
        self.timeout_source = TimeoutSource::Dynamic(Arc::new(f));
        self
    }

    /// Sets the name of this timeout instance for observability.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a call succeeds within the timeout.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - Called with the actual duration the call took to complete.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeoutEvent::Success { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback when a call fails with an error before the timeout.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - Called with the duration from when the call started until the error occurred.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeoutEvent::Error { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback when a call exceeds the timeout duration.
    ///
    /// The guarded operation is cancelled unconditionally when this fires:
    /// the in-flight future is dropped as soon as the timeout elapses.
    ///
    /// # Callback Signature
    /// `Fn()` - Called with no parameters when a timeout occurs.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, TimeoutEvent::Timeout { .. }) {
                f();
            }
        }));
        self
    }

    /// Builds the timeout layer.
    pub fn build(self) -> crate::TimeoutLayer<Req> {
        let config = TimeoutConfig {
            timeout_source: self.timeout_source,
            event_listeners: self.event_listeners,
            name: self.name,
        };

        crate::TimeoutLayer::new(config)
    }
}

impl<Req> Default for TimeoutConfigBuilder<Req> {
    fn default() -> Self {
        Self::new()
    }
}
