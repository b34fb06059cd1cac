//! Layer implementation for the adaptive client.

use crate::config::{AdaptiveClientConfig, AdaptiveClientConfigBuilder};
use crate::service::AdaptiveClient;
use crate::state::AdaptiveState;
use std::sync::{Arc, Mutex};
use tower::Layer;

/// A Tower [`Layer`] that wraps a service with client-side adaptive backpressure.
///
/// # Examples
///
/// ```
/// use resilience_adaptive::{AdaptiveClientLayer, Strategy};
/// use tower::ServiceBuilder;
/// use std::time::Duration;
///
/// let layer = AdaptiveClientLayer::builder()
///     .strategy(Strategy::Queue)
///     .max_retries(3)
///     .backpressure_threshold(0.8)
///     .max_wait(Duration::from_secs(5))
///     .build();
///
/// # async fn example() {
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(tower::service_fn(|req: http::Request<()>| async move {
///         Ok::<_, std::convert::Infallible>(http::Response::new(()))
///     }));
/// # }
/// ```
pub struct AdaptiveClientLayer {
    config: Arc<AdaptiveClientConfig>,
}

impl AdaptiveClientLayer {
    /// Creates a new layer from the given configuration.
    ///
    /// Each call to [`Layer::layer`] starts a fresh, independent backpressure
    /// state; clones of the resulting service share that one state.
    pub fn new(config: AdaptiveClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a builder for configuring an adaptive client layer.
    pub fn builder() -> AdaptiveClientConfigBuilder {
        AdaptiveClientConfigBuilder::new()
    }
}

impl Clone for AdaptiveClientLayer {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> Layer<S> for AdaptiveClientLayer {
    type Service = AdaptiveClient<S>;

    fn layer(&self, service: S) -> Self::Service {
        AdaptiveClient::new(
            service,
            Arc::clone(&self.config),
            Arc::new(Mutex::new(AdaptiveState::default())),
        )
    }
}
