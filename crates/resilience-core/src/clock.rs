//! Monotonic time abstraction used by every stateful component.
//!
//! Every pattern that measures elapsed time (token bucket refill, circuit
//! breaker cooldowns, latency windows) reads the clock through this trait
//! instead of calling `Instant::now()` directly, so tests can inject
//! deterministic time instead of sleeping in real time.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

/// A source of monotonic time and async sleep.
///
/// `Arc<dyn Clock>` is threaded through component constructors so a test
/// can substitute a [`FrozenClock`] without touching the component's logic.
pub trait Clock: Send + Sync {
    /// Returns the current monotonic instant.
    fn now(&self) -> Instant;

    /// Returns a future that resolves after `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// The default [`Clock`], backed by the system monotonic clock and Tokio's
/// timer wheel.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(tokio::time::sleep(duration))
    }
}
