//! In-process registry and HTTP introspection surface for resilience
//! components.
//!
//! Every resilience component — a circuit breaker, a bulkhead, a rate
//! limiter, and so on — can register a [`ComponentHandle`] with a
//! [`Registry`] so it can be listed, inspected, reconfigured, and
//! enabled/disabled at runtime. The registry is an ordinary value: the
//! embedding application owns it as an `Arc<Registry>` and threads it into
//! both the components it constructs and the [`router`] that exposes it
//! over HTTP. There is no hidden process-global singleton.
//!
//! # Examples
//!
//! ```
//! use resilience_controlplane::{ControlPlaneError, Registry};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct MyGate {
//!     enabled: std::sync::atomic::AtomicBool,
//! }
//!
//! impl resilience_controlplane::ComponentHandle for MyGate {
//!     fn kind(&self) -> &str { "bulkhead" }
//!     fn name(&self) -> &str { "db" }
//!     fn enabled(&self) -> bool {
//!         self.enabled.load(std::sync::atomic::Ordering::SeqCst)
//!     }
//!     fn set_enabled(&self, enabled: bool) {
//!         self.enabled.store(enabled, std::sync::atomic::Ordering::SeqCst);
//!     }
//!     fn config(&self) -> Value { json!({}) }
//!     fn update_config(&self, _patch: Value) -> Result<(), ControlPlaneError> { Ok(()) }
//!     fn metrics(&self) -> Value { json!({}) }
//!     fn reset_metrics(&self) {}
//! }
//!
//! let registry = Arc::new(Registry::new());
//! registry.register(Arc::new(MyGate { enabled: std::sync::atomic::AtomicBool::new(true) }));
//!
//! let app = resilience_controlplane::router(registry);
//! // app.nest("/failsafe", ...) when mounting under an existing axum app
//! # let _ = app;
//! ```

mod component;
mod config_file;
mod error;
mod registry;
mod router;

pub use component::{ComponentHandle, ComponentSummary};
pub use config_file::ResilienceFileConfig;
pub use error::ControlPlaneError;
pub use registry::Registry;
pub use router::router;
