use crate::{RateLimiter, RateLimiterConfig};
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that applies token-bucket rate limiting to a service.
///
/// # Examples
///
/// ```
/// use resilience_ratelimiter::RateLimiterConfig;
/// use tower::ServiceBuilder;
///
/// # async fn example() {
/// let rate_limiter = RateLimiterConfig::<String>::builder()
///     .max_executions(100)
///     .per_time_secs(1.0)
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(rate_limiter)
///     .service(my_service());
/// # }
/// # fn my_service() -> impl tower::Service<String, Response = String, Error = std::io::Error> {
/// #     tower::service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) })
/// # }
/// ```
pub struct RateLimiterLayer<Req> {
    config: Arc<RateLimiterConfig<Req>>,
}

impl<Req> Clone for RateLimiterLayer<Req> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<Req> RateLimiterLayer<Req> {
    /// Creates a new `RateLimiterLayer` with the given configuration.
    pub fn new(config: RateLimiterConfig<Req>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns the configuration backing this layer.
    pub fn config(&self) -> &RateLimiterConfig<Req> {
        &self.config
    }
}

impl<S, Req> Layer<S> for RateLimiterLayer<Req> {
    type Service = RateLimiter<S, Req>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimiter::new(service, Arc::clone(&self.config))
    }
}
