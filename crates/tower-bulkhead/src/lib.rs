//! Bulkhead pattern for Tower services.
//!
//! The bulkhead pattern isolates resources to prevent cascading failures.
//! This implementation uses semaphore-based concurrency limiting to control
//! the maximum number of concurrent calls to a service.
//!
//! # Example
//!
//! ```rust
//! use tower::ServiceBuilder;
//! use tower_bulkhead::BulkheadConfig;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let layer = BulkheadConfig::builder()
//!     .max_concurrent_calls(10)
//!     .max_wait_duration(Some(Duration::from_secs(1)))
//!     .name("my-bulkhead")
//!     .on_call_permitted(|concurrent| {
//!         println!("Call permitted, {} concurrent calls", concurrent);
//!     })
//!     .on_call_rejected(|max| {
//!         println!("Call rejected, max {} calls", max);
//!     })
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service_fn(|req: String| async move {
//!         Ok::<_, std::io::Error>(req)
//!     });
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod layer;
pub mod service;

pub use config::{BulkheadConfig, BulkheadConfigBuilder};
pub use error::{BulkheadError, Result};
pub use events::BulkheadEvent;
pub use layer::BulkheadLayer;
pub use service::Bulkhead;
