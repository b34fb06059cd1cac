//! Tower layer for the timeout pattern.

use crate::config::TimeoutConfig;
use crate::Timeout;
use std::marker::PhantomData;
use std::sync::Arc;
use tower::layer::Layer;

/// A Tower layer that applies timeout limiting to a service.
#[derive(Clone)]
pub struct TimeoutLayer<Req> {
    config: Arc<TimeoutConfig<Req>>,
}

impl<Req> TimeoutLayer<Req> {
    /// Creates a new timeout layer from the given configuration.
    pub(crate) fn new(config: impl Into<Arc<TimeoutConfig<Req>>>) -> Self {
        Self {
            config: config.into(),
        }
    }

    /// Creates a new builder for configuring a timeout layer.
    ///
    /// # Examples
    ///
    /// ## Fixed timeout (simple)
    ///
    /// ```rust
    /// use resilience_timeout::TimeoutLayer;
    /// use std::time::Duration;
    ///
    /// let layer = TimeoutLayer::<()>::builder()
    ///     .timeout_duration(Duration::from_secs(30))
    ///     .build();
    /// ```
    ///
    /// ## Per-request timeout (dynamic)
    ///
    /// ```rust
    /// use resilience_timeout::TimeoutLayer;
    /// use std::time::Duration;
    ///
    /// #[derive(Clone)]
    /// struct MyRequest {
    ///     timeout_ms: Option<u64>,
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
    pub fn builder() -> crate::TimeoutConfigBuilder<Req> {
        crate::TimeoutConfigBuilder::new()
    }
}

impl<Req> From<TimeoutConfig<Req>> for TimeoutLayer<Req> {
    fn from(config: TimeoutConfig<Req>) -> Self {
        Self::new(config)
    }
}

impl<S, Req> Layer<S> for TimeoutLayer<Req>
where
    Req: 'static,
{
    type Service = Timeout<S, Req>;

    fn layer(&self, service: S) -> Self::Service {
        Timeout::new(service, Arc::clone(&self.config), PhantomData)
    }
}
