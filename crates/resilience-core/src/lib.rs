//! Core infrastructure for the resilience engine.
//!
//! This crate provides shared functionality used across every pattern crate:
//! - A test-injectable monotonic clock
//! - An event system for observability
//! - A unified cross-layer error type

pub mod clock;
pub mod error;
pub mod events;

pub use clock::{Clock, RealClock};
pub use error::ResilienceError;
pub use events::{BoxedEventListener, EventListener, EventListeners, FnListener, ResilienceEvent};
