use crate::classifier::DefaultClassifier;
use crate::config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
use crate::CircuitBreaker;
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that applies circuit breaker behavior to an inner service.
///
/// The type parameter `C` is the failure classifier type:
/// - `CircuitBreakerLayer<DefaultClassifier>` (the default) classifies every `Err` as a failure.
/// - `CircuitBreakerLayer<FnClassifier<F>>` uses a custom classifier closure, set via
///   [`CircuitBreakerConfigBuilder::failure_classifier`].
///
/// # Examples
///
/// ```
/// use resilience_circuitbreaker::CircuitBreakerLayer;
/// use tower::{Service, ServiceBuilder, service_fn};
///
/// # async fn example() {
/// let breaker = CircuitBreakerLayer::builder()
///     .failure_threshold(3)
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(breaker)
///     .service(service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) }));
/// # }
/// ```
#[derive(Clone)]
pub struct CircuitBreakerLayer<C = DefaultClassifier> {
    config: Arc<CircuitBreakerConfig<C>>,
}

impl<C> CircuitBreakerLayer<C> {
    pub(crate) fn new(config: CircuitBreakerConfig<C>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns the configuration backing this layer.
    pub fn config(&self) -> &CircuitBreakerConfig<C> {
        &self.config
    }
}

impl CircuitBreakerLayer<DefaultClassifier> {
    /// Creates a new builder using the default failure classifier.
    pub fn builder() -> CircuitBreakerConfigBuilder<DefaultClassifier> {
        CircuitBreakerConfigBuilder::default()
    }
}

impl<S, C> Layer<S> for CircuitBreakerLayer<C> {
    type Service = CircuitBreaker<S, C>;

    fn layer(&self, service: S) -> Self::Service {
        CircuitBreaker::new(service, Arc::clone(&self.config))
    }
}
