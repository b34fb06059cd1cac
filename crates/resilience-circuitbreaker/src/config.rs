use crate::classifier::{DefaultClassifier, FnClassifier};
use crate::events::CircuitBreakerEvent;
use resilience_core::EventListeners;
use std::time::Duration;

const DEFAULT_FAILURE_THRESHOLD: usize = 5;
const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_HALF_OPEN_REQUESTS: usize = 1;

/// The algorithm the breaker uses to decide when to trip open.
///
/// Only `Consecutive` is implemented today; the variant exists so a future
/// failure-rate/sliding-window strategy can be added without breaking the
/// `gate`/`record_success`/`record_failure` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStrategy {
    /// Trip after N consecutive failures; reset the counter on any success.
    Consecutive,
}

/// Configuration for the circuit breaker pattern.
///
/// `C` is the [`FailureClassifier`](crate::classifier::FailureClassifier) used to decide
/// whether a call's result counts against the consecutive-failure count. It defaults to
/// [`DefaultClassifier`], which treats every `Err` as a failure.
pub struct CircuitBreakerConfig<C = DefaultClassifier> {
    pub(crate) failure_threshold: usize,
    pub(crate) recovery_timeout: Duration,
    pub(crate) half_open_requests: usize,
    pub(crate) strategy: BreakerStrategy,
    pub(crate) failure_classifier: C,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
    pub(crate) name: String,
}

impl CircuitBreakerConfig<DefaultClassifier> {
    /// Creates a new configuration builder with the default classifier.
    pub fn builder() -> CircuitBreakerConfigBuilder<DefaultClassifier> {
        CircuitBreakerConfigBuilder::default()
    }
}

/// Builder for configuring and constructing a circuit breaker.
pub struct CircuitBreakerConfigBuilder<C = DefaultClassifier> {
    failure_threshold: usize,
    recovery_timeout: Duration,
    half_open_requests: usize,
    strategy: BreakerStrategy,
    failure_classifier: C,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl Default for CircuitBreakerConfigBuilder<DefaultClassifier> {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_requests: DEFAULT_HALF_OPEN_REQUESTS,
            strategy: BreakerStrategy::Consecutive,
            failure_classifier: DefaultClassifier,
            event_listeners: EventListeners::new(),
            name: String::new(),
        }
    }
}

impl<C> CircuitBreakerConfigBuilder<C> {
    /// Sets the number of consecutive failures required to trip the circuit open.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, n: usize) -> Self {
        self.failure_threshold = n.max(1);
        self
    }

    /// Sets how long the circuit stays open before a probe call is admitted.
    ///
    /// Default: 30 seconds
    pub fn recovery_timeout(mut self, duration: Duration) -> Self {
        self.recovery_timeout = duration;
        self
    }

    /// Sets the number of probe calls admitted while recovering, and the number
    /// of consecutive successes among them required to close the circuit again.
    ///
    /// Default: 1
    pub fn half_open_requests(mut self, n: usize) -> Self {
        self.half_open_requests = n.max(1);
        self
    }

    /// Replaces the failure classifier with a custom closure.
    ///
    /// Default: all `Err` results count as failures.
    pub fn failure_classifier<F, Res, Err>(
        self,
        classifier: F,
    ) -> CircuitBreakerConfigBuilder<FnClassifier<F>>
    where
        F: Fn(&Result<Res, Err>) -> bool + Send + Sync + 'static,
    {
        CircuitBreakerConfigBuilder {
            failure_threshold: self.failure_threshold,
            recovery_timeout: self.recovery_timeout,
            half_open_requests: self.half_open_requests,
            strategy: self.strategy,
            failure_classifier: FnClassifier::new(classifier),
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Give this breaker a human-readable name for observability.
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Register a callback for state transition events.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState, crate::CircuitState) + Send + Sync + 'static,
    {
        use resilience_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition {
                    from_state,
                    to_state,
                    ..
                } = event
                {
                    f(*from_state, *to_state);
                }
            }));
        self
    }

    /// Register a callback for call permitted events.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        use resilience_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::CallPermitted { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Register a callback for call rejected events.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        use resilience_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                    f();
                }
            }));
        self
    }

    /// Register a callback for success recorded events.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        use resilience_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::SuccessRecorded { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Register a callback for failure recorded events.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        use resilience_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::FailureRecorded { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Builds the configuration and returns a `CircuitBreakerLayer`.
    pub fn build(self) -> crate::layer::CircuitBreakerLayer<C> {
        let config = CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout: self.recovery_timeout,
            half_open_requests: self.half_open_requests,
            strategy: self.strategy,
            failure_classifier: self.failure_classifier,
            event_listeners: self.event_listeners,
            name: self.name,
        };

        crate::layer::CircuitBreakerLayer::new(config)
    }
}
