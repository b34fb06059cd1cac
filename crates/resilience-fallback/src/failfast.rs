//! Fail-fast gate: trips after a run of consecutive failures and stays
//! tripped until reset.
//!
//! Unlike the circuit breaker, there is no half-open probing state and no
//! recovery timeout by default — once tripped, every call is rejected
//! immediately until something resets it, either an external call to
//! [`FailFast::reset`] or, if `auto_reset_after` is configured, the elapse
//! of that duration since the trip.

use futures::future::BoxFuture;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::Layer;
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::counter;

use resilience_core::{EventListeners, FnListener, ResilienceEvent};

/// Configuration for a [`FailFastLayer`].
pub struct FailFastConfig {
    pub(crate) name: String,
    pub(crate) failure_threshold: u32,
    pub(crate) auto_reset_after: Option<Duration>,
    pub(crate) listeners: EventListeners<FailFastEvent>,
}

impl FailFastConfig {
    /// Creates a builder for configuring a fail-fast layer.
    pub fn builder() -> FailFastConfigBuilder {
        FailFastConfigBuilder::new()
    }
}

/// Builder for [`FailFastConfig`].
pub struct FailFastConfigBuilder {
    name: String,
    failure_threshold: u32,
    auto_reset_after: Option<Duration>,
    listeners: EventListeners<FailFastEvent>,
}

impl Default for FailFastConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FailFastConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            name: "failfast".to_string(),
            failure_threshold: 5,
            auto_reset_after: None,
            listeners: EventListeners::new(),
        }
    }

    /// Sets the name for this instance (used in events and metrics).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the number of consecutive failures that trips the gate.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Automatically resets the gate this long after it tripped, even
    /// without an explicit [`FailFast::reset`] call.
    pub fn auto_reset_after(mut self, duration: Duration) -> Self {
        self.auto_reset_after = Some(duration);
        self
    }

    /// Registers an event listener.
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&FailFastEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(listener));
        self
    }

    /// Builds the fail-fast layer.
    pub fn build(self) -> FailFastLayer {
        FailFastLayer {
            config: Arc::new(FailFastConfig {
                name: self.name,
                failure_threshold: self.failure_threshold,
                auto_reset_after: self.auto_reset_after,
                listeners: self.listeners,
            }),
        }
    }
}

/// Events emitted by the fail-fast gate.
#[derive(Debug, Clone)]
pub enum FailFastEvent {
    /// A call passed through; the gate was closed.
    Passed {
        /// Name of the instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
    /// A call was rejected because the gate was tripped.
    Rejected {
        /// Name of the instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
    /// The gate tripped after reaching the failure threshold.
    Tripped {
        /// Name of the instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Consecutive failures observed.
        consecutive_failures: u32,
    },
    /// The gate reset, either externally or via `auto_reset_after`.
    Reset {
        /// Name of the instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
}

impl ResilienceEvent for FailFastEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Passed { .. } => "passed",
            Self::Rejected { .. } => "rejected",
            Self::Tripped { .. } => "tripped",
            Self::Reset { .. } => "reset",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Passed { timestamp, .. }
            | Self::Rejected { timestamp, .. }
            | Self::Tripped { timestamp, .. }
            | Self::Reset { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::Passed { pattern_name, .. }
            | Self::Rejected { pattern_name, .. }
            | Self::Tripped { pattern_name, .. }
            | Self::Reset { pattern_name, .. } => pattern_name,
        }
    }
}

/// Error returned by the fail-fast gate.
#[derive(Debug)]
pub enum FailFastError<E> {
    /// The gate is tripped; the inner service was not called.
    Open {
        /// Name of the instance that rejected the call.
        name: String,
    },
    /// The inner service failed.
    Inner(E),
}

impl<E> FailFastError<E> {
    /// Returns `true` if the gate rejected this call without calling the inner service.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Returns `true` if this wraps an inner service error.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }

    /// Converts into the inner error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Open { .. } => None,
            Self::Inner(e) => Some(e),
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for FailFastError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { name } => write!(f, "fail-fast gate '{name}' is open"),
            Self::Inner(e) => write!(f, "inner service error: {e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for FailFastError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { .. } => None,
            Self::Inner(e) => Some(e),
        }
    }
}

impl<E> From<FailFastError<E>> for resilience_core::ResilienceError<E> {
    fn from(err: FailFastError<E>) -> Self {
        match err {
            FailFastError::Open { name } => {
                resilience_core::ResilienceError::FailFastOpen { name: Some(name) }
            }
            FailFastError::Inner(e) => resilience_core::ResilienceError::Application(e),
        }
    }
}

/// Shared, atomically-updated trip state.
struct TripState {
    consecutive_failures: AtomicU32,
    tripped: AtomicU32,
    tripped_at_millis: AtomicU64,
    epoch: Instant,
}

impl TripState {
    fn new(epoch: Instant) -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            tripped: AtomicU32::new(0),
            tripped_at_millis: AtomicU64::new(0),
            epoch,
        }
    }

    fn is_tripped(&self, auto_reset_after: Option<Duration>) -> bool {
        if self.tripped.load(Ordering::Acquire) == 0 {
            return false;
        }
        if let Some(reset_after) = auto_reset_after {
            let tripped_at = self.tripped_at_millis.load(Ordering::Acquire);
            let elapsed_millis = self.epoch.elapsed().as_millis() as u64;
            if elapsed_millis.saturating_sub(tripped_at) >= reset_after.as_millis() as u64 {
                self.tripped.store(0, Ordering::Release);
                self.consecutive_failures.store(0, Ordering::Release);
                return false;
            }
        }
        true
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
    }

    /// Returns `true` if this failure just tripped the gate.
    fn record_failure(&self, threshold: u32) -> bool {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        if failures >= threshold && self.tripped.swap(1, Ordering::AcqRel) == 0 {
            self.tripped_at_millis
                .store(self.epoch.elapsed().as_millis() as u64, Ordering::Release);
            return true;
        }
        false
    }

    fn reset(&self) {
        self.tripped.store(0, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Release);
    }
}

/// A Tower service that rejects calls once a run of consecutive failures
/// reaches `failure_threshold`, without ever calling the inner service
/// again until reset.
pub struct FailFast<S> {
    inner: S,
    config: Arc<FailFastConfig>,
    state: Arc<TripState>,
}

impl<S> FailFast<S> {
    pub(crate) fn new(inner: S, config: Arc<FailFastConfig>, state: Arc<TripState>) -> Self {
        Self {
            inner,
            config,
            state,
        }
    }

    /// Resets the gate, as if no failures had ever been observed.
    pub fn reset(&self) {
        self.state.reset();
        let event = FailFastEvent::Reset {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
        };
        self.config.listeners.emit(&event);
    }

    /// Returns `true` if the gate is currently tripped.
    pub fn is_tripped(&self) -> bool {
        self.state.is_tripped(self.config.auto_reset_after)
    }
}

impl<S: Clone> Clone for FailFast<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S, Req> Service<Req> for FailFast<S>
where
    S: Service<Req> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = FailFastError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(FailFastError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let config = Arc::clone(&self.config);
        let state = Arc::clone(&self.state);

        if state.is_tripped(config.auto_reset_after) {
            #[cfg(feature = "tracing")]
            tracing::warn!(failfast = %config.name, "gate open, rejecting call");

            #[cfg(feature = "metrics")]
            counter!(
                "failfast_calls_total",
                "failfast" => config.name.clone(),
                "result" => "rejected"
            )
            .increment(1);

            let event = FailFastEvent::Rejected {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
            };
            config.listeners.emit(&event);

            let name = config.name.clone();
            return Box::pin(async move { Err(FailFastError::Open { name }) });
        }

        let future = self.inner.call(req);
        Box::pin(async move {
            match future.await {
                Ok(response) => {
                    state.record_success();

                    #[cfg(feature = "metrics")]
                    counter!(
                        "failfast_calls_total",
                        "failfast" => config.name.clone(),
                        "result" => "passed"
                    )
                    .increment(1);

                    let event = FailFastEvent::Passed {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                    };
                    config.listeners.emit(&event);

                    Ok(response)
                }
                Err(error) => {
                    if state.record_failure(config.failure_threshold) {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(failfast = %config.name, "gate tripped");

                        let event = FailFastEvent::Tripped {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                            consecutive_failures: config.failure_threshold,
                        };
                        config.listeners.emit(&event);
                    }

                    #[cfg(feature = "metrics")]
                    counter!(
                        "failfast_calls_total",
                        "failfast" => config.name.clone(),
                        "result" => "failed"
                    )
                    .increment(1);

                    Err(FailFastError::Inner(error))
                }
            }
        })
    }
}

/// A Tower [`Layer`] that wraps a service with a fail-fast gate.
pub struct FailFastLayer {
    config: Arc<FailFastConfig>,
}

impl FailFastLayer {
    /// Creates a builder for configuring a fail-fast layer.
    pub fn builder() -> FailFastConfigBuilder {
        FailFastConfigBuilder::new()
    }
}

impl Clone for FailFastLayer {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> Layer<S> for FailFastLayer {
    type Service = FailFast<S>;

    fn layer(&self, service: S) -> Self::Service {
        FailFast::new(service, Arc::clone(&self.config), Arc::new(TripState::new(Instant::now())))
    }
}
