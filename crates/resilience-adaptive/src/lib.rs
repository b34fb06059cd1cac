//! Client-side adaptive backpressure for Tower/HTTP clients.
//!
//! This crate wraps outgoing HTTP calls and reads the backpressure signals a
//! server advertises on its responses: `Retry-After` /
//! `X-RateLimit-Retry-After-Ms` and `X-Backpressure` on `429`, and
//! `X-Backpressure` / `RateLimit-Remaining` on `2xx`. It remembers the most
//! recent signal and, before the next call, either sleeps it out
//! (`Strategy::Queue`) or fails fast (`Strategy::Reject`) rather than hammer
//! a server that has already asked to be left alone.
//!
//! Unlike a server-side rate limiter, which decides whether to admit a
//! request, the adaptive client is entirely advisory: it never blocks a call
//! the server hasn't already signalled distress about, and a server that
//! never sends these headers sees no behavior change at all.
//!
//! # Example
//!
//! ```
//! use resilience_adaptive::{AdaptiveClientLayer, Strategy};
//! use tower::{Service, ServiceBuilder, ServiceExt};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let layer = AdaptiveClientLayer::builder()
//!     .strategy(Strategy::Queue)
//!     .max_retries(3)
//!     .backpressure_threshold(0.8)
//!     .max_wait(Duration::from_secs(5))
//!     .build();
//!
//! let mut client = ServiceBuilder::new().layer(layer).service(tower::service_fn(
//!     |_req: http::Request<()>| async move {
//!         Ok::<_, std::convert::Infallible>(http::Response::new(()))
//!     },
//! ));
//!
//! let response = client.ready().await?.call(http::Request::new(())).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Rejecting instead of queueing
//!
//! ```
//! use resilience_adaptive::{AdaptiveClientLayer, AdaptiveClientError};
//! use tower::{Service, ServiceBuilder, ServiceExt};
//!
//! # async fn example() {
//! let layer = AdaptiveClientLayer::builder().reject().build();
//!
//! let mut client = ServiceBuilder::new().layer(layer).service(tower::service_fn(
//!     |_req: http::Request<()>| async move {
//!         Ok::<_, std::convert::Infallible>(
//!             http::Response::builder()
//!                 .status(429)
//!                 .header("retry-after", "5")
//!                 .body(())
//!                 .unwrap(),
//!         )
//!     },
//! ));
//!
//! let result = client.ready().await.unwrap().call(http::Request::new(())).await;
//! assert!(matches!(result, Err(AdaptiveClientError::RateLimited { .. })));
//! # }
//! ```
//!
//! Composing with [`resilience_core::ResilienceError`] collapses this (and
//! every other layer's error) into a single application-wide error type:
//!
//! ```
//! use resilience_adaptive::AdaptiveClientError;
//! use resilience_core::ResilienceError;
//!
//! fn handle(err: AdaptiveClientError<std::convert::Infallible>) -> ResilienceError<std::convert::Infallible> {
//!     err.into()
//! }
//! ```

mod config;
mod error;
mod events;
mod headers;
mod layer;
mod service;
mod state;

pub use config::{AdaptiveClientConfig, AdaptiveClientConfigBuilder, Strategy};
pub use error::AdaptiveClientError;
pub use events::{AdaptiveClientEvent, QueueReason};
pub use layer::AdaptiveClientLayer;
pub use service::AdaptiveClient;
