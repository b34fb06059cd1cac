use crate::classifier::FailureClassifier;
use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::counter;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// The three states a consecutive-failure circuit breaker can be in.
///
/// Kept as a mirrored `AtomicU8` on [`crate::CircuitBreaker`] so callers can
/// read the current state without taking the async mutex.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through; failures are counted.
    Closed = 0,
    /// Calls are rejected until `recovery_timeout` elapses.
    Open = 1,
    /// A limited number of probe calls are admitted to test recovery.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }
}

/// The breaker's internal state machine.
///
/// Implements the consecutive-failure variant: N failures in a row trip the
/// breaker open; after `recovery_timeout` a limited number of probe calls are
/// let through, and the circuit closes again once enough of them succeed.
pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    consecutive_failures: usize,
    opened_at: Option<Instant>,
    half_open_permits_issued: usize,
    half_open_successes: usize,
}

impl Circuit {
    pub(crate) fn new_with_atomic(state_atomic: Arc<AtomicU8>) -> Self {
        Self {
            state: CircuitState::Closed,
            state_atomic,
            consecutive_failures: 0,
            opened_at: None,
            half_open_permits_issued: 0,
            half_open_successes: 0,
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    fn transition_to<C>(&mut self, config: &CircuitBreakerConfig<C>, to: CircuitState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        self.state_atomic.store(to as u8, Ordering::Release);

        #[cfg(feature = "tracing")]
        tracing::debug!(breaker = %config.name, from = ?from, to = ?to, "circuit breaker transition");

        #[cfg(feature = "metrics")]
        {
            counter!("circuitbreaker_transitions_total").increment(1);
            metrics::gauge!("circuitbreaker_state").set(to as u8 as f64);
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                from_state: from,
                to_state: to,
            });
    }

    fn open<C>(&mut self, config: &CircuitBreakerConfig<C>) {
        self.opened_at = Some(Instant::now());
        self.half_open_permits_issued = 0;
        self.half_open_successes = 0;
        self.transition_to(config, CircuitState::Open);
    }

    pub(crate) fn force_open<C>(&mut self, config: &CircuitBreakerConfig<C>) {
        self.consecutive_failures = config.failure_threshold;
        self.open(config);
    }

    pub(crate) fn force_closed<C>(&mut self, config: &CircuitBreakerConfig<C>) {
        self.reset(config);
    }

    pub(crate) fn reset<C>(&mut self, config: &CircuitBreakerConfig<C>) {
        self.consecutive_failures = 0;
        self.opened_at = None;
        self.half_open_permits_issued = 0;
        self.half_open_successes = 0;
        self.transition_to(config, CircuitState::Closed);
    }

    fn emit_permitted<C>(&self, config: &CircuitBreakerConfig<C>) {
        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "outcome" => "permitted").increment(1);
        config
            .event_listeners
            .emit(&CircuitBreakerEvent::CallPermitted {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });
    }

    fn emit_rejected<C>(&self, config: &CircuitBreakerConfig<C>) {
        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "outcome" => "rejected").increment(1);
        config
            .event_listeners
            .emit(&CircuitBreakerEvent::CallRejected {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
            });
    }

    /// Gates a call. Returns `true` if the caller may proceed.
    pub(crate) fn try_acquire<C>(&mut self, config: &CircuitBreakerConfig<C>) -> bool {
        let permitted = match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let opened_at = self
                    .opened_at
                    .expect("opened_at is always set while Open");
                if Instant::now() >= opened_at + config.recovery_timeout {
                    self.half_open_permits_issued = 1;
                    self.half_open_successes = 0;
                    self.transition_to(config, CircuitState::HalfOpen);
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if self.half_open_permits_issued < config.half_open_requests {
                    self.half_open_permits_issued += 1;
                    true
                } else {
                    false
                }
            }
        };

        if permitted {
            self.emit_permitted(config);
        } else {
            self.emit_rejected(config);
        }
        permitted
    }

    pub(crate) fn record_success<C>(&mut self, config: &CircuitBreakerConfig<C>) {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                self.half_open_successes += 1;
                if self.half_open_successes >= config.half_open_requests {
                    self.reset(config);
                    return;
                }
            }
            CircuitState::Open => {}
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });
    }

    pub(crate) fn record_failure<C>(&mut self, config: &CircuitBreakerConfig<C>) {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= config.failure_threshold {
                    self.open(config);
                }
            }
            CircuitState::HalfOpen => {
                self.consecutive_failures = config.failure_threshold;
                self.open(config);
            }
            CircuitState::Open => {}
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });
    }
}

/// Classifies a call result and records it against the circuit.
pub(crate) fn record_outcome<C, Res, Err>(
    circuit: &mut Circuit,
    config: &CircuitBreakerConfig<C>,
    result: &Result<Res, Err>,
) where
    C: FailureClassifier<Res, Err>,
{
    if config.failure_classifier.classify(result) {
        circuit.record_failure(config);
    } else {
        circuit.record_success(config);
    }
}
