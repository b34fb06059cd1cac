//! Service implementation for the adaptive client.

use crate::config::{AdaptiveClientConfig, Strategy};
use crate::error::AdaptiveClientError;
use crate::events::{AdaptiveClientEvent, QueueReason};
use crate::headers;
use crate::state::AdaptiveState;
use futures::future::BoxFuture;
use http::{Request, Response, StatusCode};
use resilience_core::Clock;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::counter;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// A Tower [`Service`] that wraps outgoing HTTP calls with client-side
/// adaptive backpressure.
///
/// Before sending, it consults shared state learned from prior responses:
/// if still inside a `429` cooldown, or if the last-seen backpressure score
/// clears the configured threshold, it either sleeps the wait out
/// (`Strategy::Queue`) or fails immediately (`Strategy::Reject`). On a fresh
/// `429` it records the new cooldown and backpressure and, under `Queue`,
/// retries up to `max_retries` times with each wait scaled by
/// `backoff_multiplier`.
pub struct AdaptiveClient<S> {
    inner: S,
    config: Arc<AdaptiveClientConfig>,
    state: Arc<Mutex<AdaptiveState>>,
}

impl<S> AdaptiveClient<S> {
    pub(crate) fn new(
        inner: S,
        config: Arc<AdaptiveClientConfig>,
        state: Arc<Mutex<AdaptiveState>>,
    ) -> Self {
        Self {
            inner,
            config,
            state,
        }
    }

    /// The current backpressure score last observed from a response, `[0, 1]`.
    pub fn backpressure(&self) -> f64 {
        self.state.lock().unwrap().backpressure
    }

    /// Whether the client currently believes it is rate-limited.
    pub fn is_rate_limited(&self) -> bool {
        self.state.lock().unwrap().is_rate_limited
    }
}

impl<S: Clone> Clone for AdaptiveClient<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
        }
    }
}

/// Computes the wait before sending, and why, from currently-held state.
/// Returns `None` when there's no reason to hold off.
fn pre_send_wait(
    config: &AdaptiveClientConfig,
    state: &Mutex<AdaptiveState>,
) -> Option<(Duration, QueueReason)> {
    let now = Instant::now();
    let s = state.lock().unwrap();

    if s.is_rate_limited {
        if let Some(deadline) = s.retry_after_deadline {
            let remaining = deadline.saturating_duration_since(now);
            if !remaining.is_zero() {
                return Some((remaining, QueueReason::RateLimitCooldown));
            }
        }
    }

    if config.respect_backpressure && s.backpressure >= config.backpressure_threshold {
        let wait = config.max_wait.mul_f64(s.backpressure.min(1.0));
        return Some((wait.min(config.max_wait), QueueReason::Backpressure));
    }

    None
}

fn scale_wait(base: Duration, multiplier: f64, attempt: usize) -> Duration {
    base.mul_f64(multiplier.max(0.0).powi(attempt as i32))
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AdaptiveClient<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Clone + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = AdaptiveClientError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(AdaptiveClientError::Inner)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut service = self.inner.clone();
        let config = Arc::clone(&self.config);
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            let mut attempt = 0usize;

            loop {
                if let Some((wait, reason)) = pre_send_wait(&config, &state) {
                    match config.strategy {
                        Strategy::Reject => {
                            let (retry_after, backpressure) = {
                                let s = state.lock().unwrap();
                                (Some(wait), s.backpressure)
                            };
                            #[cfg(feature = "tracing")]
                            debug!(client = %config.name, ?reason, "rejecting call while rate-limited");
                            config
                                .listeners
                                .emit(&AdaptiveClientEvent::RequestRejected {
                                    pattern_name: config.name.clone(),
                                    timestamp: Instant::now(),
                                    retry_after,
                                    backpressure,
                                });
                            return Err(AdaptiveClientError::RateLimited {
                                retry_after,
                                backpressure,
                            });
                        }
                        Strategy::Queue => {
                            config
                                .listeners
                                .emit(&AdaptiveClientEvent::RequestQueued {
                                    pattern_name: config.name.clone(),
                                    timestamp: Instant::now(),
                                    wait,
                                    reason,
                                });
                            config.clock.sleep(wait).await;
                        }
                    }
                }

                let response = service
                    .call(req.clone())
                    .await
                    .map_err(AdaptiveClientError::Inner)?;

                if response.status() == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after = headers::parse_retry_after(response.headers());
                    let backpressure =
                        headers::parse_backpressure(response.headers()).unwrap_or(0.0);
                    let remaining = headers::parse_remaining_tokens(response.headers());
                    let base_wait = retry_after.unwrap_or(config.max_wait).min(config.max_wait);
                    let deadline = Instant::now() + base_wait;

                    {
                        let mut s = state.lock().unwrap();
                        s.observe_429(deadline, backpressure, remaining);
                    }
                    config
                        .listeners
                        .emit(&AdaptiveClientEvent::BackpressureObserved {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                            backpressure,
                        });

                    #[cfg(feature = "metrics")]
                    counter!("adaptive_client_429_total", "client" => config.name.clone())
                        .increment(1);

                    match config.strategy {
                        Strategy::Reject => {
                            config
                                .listeners
                                .emit(&AdaptiveClientEvent::RequestRejected {
                                    pattern_name: config.name.clone(),
                                    timestamp: Instant::now(),
                                    retry_after,
                                    backpressure,
                                });
                            return Err(AdaptiveClientError::RateLimited {
                                retry_after,
                                backpressure,
                            });
                        }
                        Strategy::Queue => {
                            if attempt + 1 >= config.max_retries {
                                #[cfg(feature = "tracing")]
                                warn!(client = %config.name, attempts = attempt + 1, "adaptive client retries exhausted");
                                config
                                    .listeners
                                    .emit(&AdaptiveClientEvent::RetriesExhausted {
                                        pattern_name: config.name.clone(),
                                        timestamp: Instant::now(),
                                        attempts: attempt + 1,
                                    });
                                return Err(AdaptiveClientError::MaxRetriesExceeded {
                                    attempts: attempt + 1,
                                });
                            }

                            let retry_wait =
                                scale_wait(base_wait, config.backoff_multiplier, attempt)
                                    .min(config.max_wait);
                            config
                                .listeners
                                .emit(&AdaptiveClientEvent::RetryScheduled {
                                    pattern_name: config.name.clone(),
                                    timestamp: Instant::now(),
                                    attempt: attempt + 1,
                                    wait: retry_wait,
                                });
                            config.clock.sleep(retry_wait).await;
                            attempt += 1;
                            continue;
                        }
                    }
                }

                if response.status().is_success() {
                    let backpressure = headers::parse_backpressure(response.headers());
                    let remaining = headers::parse_remaining_tokens(response.headers());
                    let mut s = state.lock().unwrap();
                    s.observe_2xx(backpressure, remaining);
                }

                return Ok(response);
            }
        })
    }
}
