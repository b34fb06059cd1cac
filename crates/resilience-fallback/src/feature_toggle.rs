//! Feature toggle gate: routes to an alternative path (or rejects) while a
//! named feature is disabled, without touching the inner service at all.
//!
//! The toggle itself carries no failure-detection logic; it's flipped
//! externally, typically from a control-plane update (see
//! [`resilience_core`](resilience_core)'s registry-facing types) or simply
//! by holding onto the built [`FeatureToggle`] handle and calling
//! [`FeatureToggle::disable`] / [`FeatureToggle::enable`] directly.

use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Layer;
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::counter;

use resilience_core::{EventListeners, FnListener, ResilienceEvent};

/// Function that produces an alternative response while a feature is disabled.
pub type AlternativeFn<Res> = Arc<dyn Fn() -> Res + Send + Sync>;

/// Configuration for a [`FeatureToggleLayer`].
pub struct FeatureToggleConfig<Res> {
    pub(crate) name: String,
    pub(crate) initially_enabled: bool,
    pub(crate) alternative: Option<AlternativeFn<Res>>,
    pub(crate) listeners: EventListeners<FeatureToggleEvent>,
}

impl<Res> FeatureToggleConfig<Res> {
    /// Creates a builder for configuring a feature toggle layer.
    pub fn builder() -> FeatureToggleConfigBuilder<Res> {
        FeatureToggleConfigBuilder::new()
    }
}

/// Builder for [`FeatureToggleConfig`].
pub struct FeatureToggleConfigBuilder<Res> {
    name: String,
    initially_enabled: bool,
    alternative: Option<AlternativeFn<Res>>,
    listeners: EventListeners<FeatureToggleEvent>,
}

impl<Res> Default for FeatureToggleConfigBuilder<Res> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Res> FeatureToggleConfigBuilder<Res> {
    /// Creates a new builder with default settings (feature enabled, no alternative).
    pub fn new() -> Self {
        Self {
            name: "feature".to_string(),
            initially_enabled: true,
            alternative: None,
            listeners: EventListeners::new(),
        }
    }

    /// Sets the name of the feature (used in events and the rejection error).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets whether the feature starts out enabled. Default `true`.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.initially_enabled = enabled;
        self
    }

    /// Provides an alternative response to use while the feature is disabled.
    ///
    /// Without this, a disabled feature fails every call with
    /// [`FeatureToggleError::Disabled`].
    pub fn alternative<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Res + Send + Sync + 'static,
    {
        self.alternative = Some(Arc::new(f));
        self
    }

    /// Registers an event listener.
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&FeatureToggleEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(listener));
        self
    }

    /// Builds the feature toggle layer.
    pub fn build(self) -> FeatureToggleLayer<Res> {
        FeatureToggleLayer {
            config: Arc::new(FeatureToggleConfig {
                name: self.name,
                initially_enabled: self.initially_enabled,
                alternative: self.alternative,
                listeners: self.listeners,
            }),
        }
    }
}

/// Events emitted by the feature toggle gate.
#[derive(Debug, Clone)]
pub enum FeatureToggleEvent {
    /// The feature was enabled; the call reached the inner service.
    Passed {
        /// Name of the feature.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
    /// The feature was disabled and an alternative response was used.
    Rerouted {
        /// Name of the feature.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
    /// The feature was disabled and no alternative was configured.
    Rejected {
        /// Name of the feature.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
}

impl ResilienceEvent for FeatureToggleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Passed { .. } => "passed",
            Self::Rerouted { .. } => "rerouted",
            Self::Rejected { .. } => "rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Passed { timestamp, .. }
            | Self::Rerouted { timestamp, .. }
            | Self::Rejected { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::Passed { pattern_name, .. }
            | Self::Rerouted { pattern_name, .. }
            | Self::Rejected { pattern_name, .. } => pattern_name,
        }
    }
}

/// Error returned when a disabled feature has no alternative configured.
#[derive(Debug)]
pub enum FeatureToggleError<E> {
    /// The feature is disabled and no alternative response was configured.
    Disabled {
        /// Name of the disabled feature.
        name: String,
    },
    /// The inner service failed.
    Inner(E),
}

impl<E> FeatureToggleError<E> {
    /// Returns `true` if this call was rejected because the feature is disabled.
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled { .. })
    }

    /// Converts into the inner error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Disabled { .. } => None,
            Self::Inner(e) => Some(e),
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for FeatureToggleError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled { name } => write!(f, "feature '{name}' is disabled"),
            Self::Inner(e) => write!(f, "inner service error: {e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for FeatureToggleError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Disabled { .. } => None,
            Self::Inner(e) => Some(e),
        }
    }
}

impl<E> From<FeatureToggleError<E>> for resilience_core::ResilienceError<E> {
    fn from(err: FeatureToggleError<E>) -> Self {
        match err {
            FeatureToggleError::Disabled { name } => {
                resilience_core::ResilienceError::FeatureDisabled { name }
            }
            FeatureToggleError::Inner(e) => resilience_core::ResilienceError::Application(e),
        }
    }
}

/// A Tower service that routes around its inner service while a named
/// feature is disabled.
pub struct FeatureToggle<S, Res> {
    inner: S,
    config: Arc<FeatureToggleConfig<Res>>,
    enabled: Arc<AtomicBool>,
}

impl<S, Res> FeatureToggle<S, Res> {
    pub(crate) fn new(inner: S, config: Arc<FeatureToggleConfig<Res>>, enabled: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            config,
            enabled,
        }
    }

    /// Enables the feature, routing calls to the inner service again.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Disables the feature, routing calls to the alternative (or rejecting).
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Returns `true` if the feature is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl<S: Clone, Res> Clone for FeatureToggle<S, Res> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            enabled: Arc::clone(&self.enabled),
        }
    }
}

impl<S, Req, Res> Service<Req> for FeatureToggle<S, Res>
where
    S: Service<Req, Response = Res> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
    Res: Send + 'static,
{
    type Response = Res;
    type Error = FeatureToggleError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(FeatureToggleError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let config = Arc::clone(&self.config);

        if !self.enabled.load(Ordering::Acquire) {
            return match &config.alternative {
                Some(alternative) => {
                    let alternative = Arc::clone(alternative);
                    #[cfg(feature = "metrics")]
                    counter!(
                        "feature_toggle_calls_total",
                        "feature" => config.name.clone(),
                        "result" => "rerouted"
                    )
                    .increment(1);

                    let event = FeatureToggleEvent::Rerouted {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                    };
                    config.listeners.emit(&event);

                    Box::pin(async move { Ok(alternative()) })
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(feature = %config.name, "disabled, no alternative configured");

                    #[cfg(feature = "metrics")]
                    counter!(
                        "feature_toggle_calls_total",
                        "feature" => config.name.clone(),
                        "result" => "rejected"
                    )
                    .increment(1);

                    let event = FeatureToggleEvent::Rejected {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                    };
                    config.listeners.emit(&event);

                    let name = config.name.clone();
                    Box::pin(async move { Err(FeatureToggleError::Disabled { name }) })
                }
            };
        }

        let future = self.inner.call(req);
        Box::pin(async move {
            let event = FeatureToggleEvent::Passed {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
            };
            config.listeners.emit(&event);

            #[cfg(feature = "metrics")]
            counter!(
                "feature_toggle_calls_total",
                "feature" => config.name.clone(),
                "result" => "passed"
            )
            .increment(1);

            future.await.map_err(FeatureToggleError::Inner)
        })
    }
}

/// A Tower [`Layer`] that wraps a service with a feature toggle gate.
pub struct FeatureToggleLayer<Res> {
    config: Arc<FeatureToggleConfig<Res>>,
}

impl<Res> FeatureToggleLayer<Res> {
    /// Creates a builder for configuring a feature toggle layer.
    pub fn builder() -> FeatureToggleConfigBuilder<Res> {
        FeatureToggleConfigBuilder::new()
    }
}

impl<Res> Clone for FeatureToggleLayer<Res> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Res> Layer<S> for FeatureToggleLayer<Res> {
    type Service = FeatureToggle<S, Res>;

    fn layer(&self, service: S) -> Self::Service {
        FeatureToggle::new(
            service,
            Arc::clone(&self.config),
            Arc::new(AtomicBool::new(self.config.initially_enabled)),
        )
    }
}
