//! Timeout handling for Tower services.
//!
//! Bounds a single operation to a configured duration. On expiry the guarded
//! future is dropped (cancelled) and the call fails with [`TimeoutError::Timeout`].
//! The timeout never retries; pair it with a retry layer above it in the stack
//! if retrying on timeout is desired.
//!
//! ## Basic Example
//!
//! ```rust
//! use resilience_timeout::TimeoutConfig;
//! use tower::{Layer, service_fn};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let layer = TimeoutConfig::builder()
//!     .timeout_duration(Duration::from_secs(5))
//!     .on_timeout(|| {
//!         eprintln!("Request timed out!");
//!     })
//!     .build();
//!
//! let svc = service_fn(|req: String| async move {
//!     Ok::<String, ()>(req)
//! });
//!
//! let mut service = layer.layer(svc);
//! # }
//! ```
//!
//! ## Event Listeners
//!
//! ```rust
//! use resilience_timeout::TimeoutConfig;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let layer = TimeoutConfig::builder()
//!     .timeout_duration(Duration::from_secs(5))
//!     .on_success(|duration| {
//!         println!("Call succeeded in {:?}", duration);
//!     })
//!     .on_error(|duration| {
//!         println!("Call failed after {:?}", duration);
//!     })
//!     .on_timeout(|| {
//!         println!("Call timed out");
//!     })
//!     .build();
//! # }
//! ```

use futures::future::BoxFuture;
use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::time::timeout;
use tower::Service;

pub use config::{TimeoutConfig, TimeoutConfigBuilder, TimeoutSource};
pub use error::TimeoutError;
pub use events::TimeoutEvent;
pub use layer::TimeoutLayer;

mod config;
mod error;
mod events;
mod layer;

/// A Tower service that bounds an inner service's calls to a configured duration.
#[derive(Clone)]
pub struct Timeout<S, Req> {
    inner: S,
    config: Arc<TimeoutConfig<Req>>,
    _phantom: PhantomData<Req>,
}

impl<S, Req> Timeout<S, Req> {
    /// Creates a new timeout service wrapping the given service.
    pub(crate) fn new(inner: S, config: Arc<TimeoutConfig<Req>>, _phantom: PhantomData<Req>) -> Self {
        Self {
            inner,
            config,
            _phantom,
        }
    }
}

impl<S, Request> Service<Request> for Timeout<S, Request>
where
    S: Service<Request> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = TimeoutError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(TimeoutError::Inner)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let mut inner = self.inner.clone();
        let config = Arc::clone(&self.config);
        let timeout_duration = config.timeout_source.get_timeout(&req);

        Box::pin(async move {
            let start = Instant::now();

            match timeout(timeout_duration, inner.call(req)).await {
                Ok(Ok(response)) => {
                    let duration = start.elapsed();
                    config.event_listeners.emit(&TimeoutEvent::Success {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        duration,
                    });
                    Ok(response)
                }
                Ok(Err(err)) => {
                    let duration = start.elapsed();
                    config.event_listeners.emit(&TimeoutEvent::Error {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        duration,
                    });
                    Err(TimeoutError::Inner(err))
                }
                Err(_elapsed) => {
                    config.event_listeners.emit(&TimeoutEvent::Timeout {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        timeout_duration,
                    });
                    Err(TimeoutError::Timeout)
                }
            }
        })
    }
}
