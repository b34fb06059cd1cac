//! Consecutive-failure circuit breaker middleware for Tower services.
//!
//! Wraps a service with a `gate() -> permit | reject` contract: once
//! `failure_threshold` calls fail in a row the circuit opens and every call is
//! rejected with [`CircuitBreakerError::CircuitOpen`] until `recovery_timeout`
//! elapses, at which point a limited number of probe calls are admitted to
//! test whether the dependency has recovered.
//!
//! # Examples
//!
//! ```
//! use resilience_circuitbreaker::CircuitBreakerLayer;
//! use std::time::Duration;
//! use tower::{Service, ServiceBuilder, service_fn};
//!
//! # async fn example() {
//! let layer = CircuitBreakerLayer::builder()
//!     .failure_threshold(3)
//!     .recovery_timeout(Duration::from_secs(30))
//!     .half_open_requests(2)
//!     .name("payments-api")
//!     .build();
//!
//! let svc = service_fn(|req: String| async move { Ok::<String, ()>(req) });
//! let mut service = layer.layer(svc);
//! # let _ = service.call("hello".to_string());
//! # }
//! ```
//!
//! ## Event listeners
//!
//! ```
//! use resilience_circuitbreaker::CircuitBreakerLayer;
//!
//! let layer = CircuitBreakerLayer::builder()
//!     .failure_threshold(3)
//!     .on_state_transition(|from, to| {
//!         println!("circuit breaker: {:?} -> {:?}", from, to);
//!     })
//!     .build();
//! # let _ = layer;
//! ```
//!
//! ## Custom classifier
//!
//! ```
//! use resilience_circuitbreaker::CircuitBreakerLayer;
//! use std::io::{Error, ErrorKind};
//!
//! // Don't count timeouts as failures.
//! let layer = CircuitBreakerLayer::builder()
//!     .failure_classifier(|result: &Result<String, Error>| {
//!         matches!(result, Err(e) if e.kind() != ErrorKind::TimedOut)
//!     })
//!     .build();
//! # let _ = layer;
//! ```
//!
//! ## Feature flags
//! - `metrics`: records call/transition counters and a state gauge via the `metrics` crate.
//! - `tracing`: emits debug-level spans and events via the `tracing` crate.

use crate::circuit::{record_outcome, Circuit};
use crate::classifier::{DefaultClassifier, FailureClassifier};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Mutex;
use tower::Service;

pub mod classifier;
mod circuit;
mod config;
mod error;
mod events;
#[cfg(feature = "controlplane")]
mod handle;
mod layer;

pub use circuit::CircuitState;
pub use config::{BreakerStrategy, CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
#[cfg(feature = "controlplane")]
pub use handle::CircuitBreakerHandle;
pub use layer::CircuitBreakerLayer;

/// A Tower [`Service`] that gates calls to an inner service behind a circuit breaker.
///
/// Constructed via [`CircuitBreakerLayer`]; not meant to be built directly.
pub struct CircuitBreaker<S, C = DefaultClassifier> {
    inner: S,
    circuit: Arc<Mutex<Circuit>>,
    state_atomic: Arc<AtomicU8>,
    config: Arc<CircuitBreakerConfig<C>>,
    enabled: Arc<AtomicBool>,
}

impl<S: Clone, C> Clone for CircuitBreaker<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            circuit: Arc::clone(&self.circuit),
            state_atomic: Arc::clone(&self.state_atomic),
            config: Arc::clone(&self.config),
            enabled: Arc::clone(&self.enabled),
        }
    }
}

impl<S, C> CircuitBreaker<S, C> {
    pub(crate) fn new(inner: S, config: Arc<CircuitBreakerConfig<C>>) -> Self {
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            inner,
            circuit: Arc::new(Mutex::new(Circuit::new_with_atomic(Arc::clone(
                &state_atomic,
            )))),
            state_atomic,
            config,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Disables enforcement: every call passes straight through to the inner
    /// service, bypassing the gate entirely. The circuit's state (consecutive
    /// failure count, open/closed/half-open) is left untouched and resumes
    /// exactly where it was once re-enabled.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Re-enables enforcement.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Returns `true` if the breaker is currently enforcing its protection.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Returns the shared gate bit, for wiring into a
    /// [`ComponentHandle`](crate::CircuitBreakerHandle) without giving the
    /// handle access to the breaker's circuit state.
    #[cfg(feature = "controlplane")]
    pub(crate) fn enabled_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.enabled)
    }

    /// Forces the circuit into the open state, rejecting calls until a probe is due.
    pub async fn force_open(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_open(&self.config);
    }

    /// Forces the circuit into the closed state and clears its failure count.
    pub async fn force_closed(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_closed(&self.config);
    }

    /// Resets the circuit to the closed state and clears all counters.
    pub async fn reset(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.reset(&self.config);
    }

    /// Returns the current state of the circuit.
    pub async fn state(&self) -> CircuitState {
        let circuit = self.circuit.lock().await;
        circuit.state()
    }

    /// Returns the current state without an async lock, safe to call from sync
    /// code such as a metrics scrape or a health check.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }
}

impl<S, Req, C> Service<Req> for CircuitBreaker<S, C>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
    C: FailureClassifier<S::Response, S::Error> + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = CircuitBreakerError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(CircuitBreakerError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let config = Arc::clone(&self.config);
        let circuit = Arc::clone(&self.circuit);
        let mut inner = self.inner.clone();

        if !self.enabled.load(Ordering::Acquire) {
            return Box::pin(async move { inner.call(req).await.map_err(CircuitBreakerError::Inner) });
        }

        Box::pin(async move {
            let permitted = {
                let mut circuit = circuit.lock().await;
                circuit.try_acquire(&config)
            };

            if !permitted {
                let name = (!config.name.is_empty()).then(|| config.name.clone());
                return Err(CircuitBreakerError::CircuitOpen { name });
            }

            let result = inner.call(req).await;

            {
                let mut circuit = circuit.lock().await;
                record_outcome(&mut circuit, &config, &result);
            }

            result.map_err(CircuitBreakerError::Inner)
        })
    }
}
