//! Bulkhead pattern for Tower services.
//!
//! The bulkhead pattern isolates resources to prevent cascading failures.
//! This implementation uses a semaphore for the concurrent-call slots and a
//! bounded FIFO queue for callers waiting on a slot; once both are full,
//! calls are rejected with `BulkheadFull`.
//!
//! # Basic Example
//!
//! ```rust
//! use tower::ServiceBuilder;
//! use resilience_bulkhead::BulkheadConfig;
//!
//! # async fn example() {
//! // Admit 10 concurrent calls, queue up to 20 more.
//! let layer = BulkheadConfig::builder()
//!     .max_concurrent_calls(10)
//!     .max_queued(20)
//!     .name("my-bulkhead")
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service_fn(|req: String| async move {
//!         Ok::<_, ()>(req)
//!     });
//! # }
//! ```
//!
//! # Rejecting Instead of Queueing
//!
//! ```rust
//! use tower::ServiceBuilder;
//! use resilience_bulkhead::BulkheadConfig;
//!
//! # async fn example() {
//! let layer = BulkheadConfig::builder()
//!     .max_concurrent_calls(5)
//!     .reject_when_full()
//!     .name("strict-bulkhead")
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service_fn(|req: String| async move {
//!         Ok::<_, ()>(req)
//!     });
//! # }
//! ```
//!
//! # Event Listeners
//!
//! ```rust
//! use tower::ServiceBuilder;
//! use resilience_bulkhead::BulkheadConfig;
//!
//! # async fn example() {
//! let layer = BulkheadConfig::builder()
//!     .max_concurrent_calls(10)
//!     .name("monitored-bulkhead")
//!     .on_call_queued(|queued| {
//!         println!("call queued ({} waiting)", queued);
//!     })
//!     .on_call_rejected(|max| {
//!         println!("call rejected (max {} concurrent)", max);
//!     })
//!     .on_call_finished(|duration| {
//!         println!("call finished in {:?}", duration);
//!     })
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service_fn(|req: String| async move {
//!         Ok::<_, ()>(req)
//!     });
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod layer;
pub mod service;

pub use config::{BulkheadConfig, BulkheadConfigBuilder};
pub use error::BulkheadError;
pub use events::BulkheadEvent;
pub use layer::BulkheadLayer;
pub use service::Bulkhead;
