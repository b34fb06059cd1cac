//! Adaptive token-bucket rate limiting middleware for Tower services.
//!
//! Unlike a fixed-window limiter, the bucket here refills continuously and
//! lazily: tokens accrue at `max_executions / per_time_secs` per second and
//! are topped up on every acquisition attempt, so there is no thundering herd
//! at period boundaries. A latency-driven [`backpressure`] score can also
//! feed into the `Retry-After` calculation, so clients back off harder when
//! the guarded service is visibly struggling rather than only when the
//! bucket is literally empty.
//!
//! # Examples
//!
//! ```
//! use resilience_ratelimiter::RateLimiterConfig;
//! use tower::ServiceBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let rate_limiter = RateLimiterConfig::<String>::builder()
//!     .max_executions(100)
//!     .per_time_secs(1.0)
//!     .client_key(|req: &String| Some(req.clone()))
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(rate_limiter)
//!     .service(tower::service_fn(|req: String| async move {
//!         Ok::<_, std::io::Error>(format!("Response: {}", req))
//!     }));
//! # Ok(())
//! # }
//! ```

pub mod backpressure;
mod bucket;
mod config;
mod error;
mod events;
mod layer;
pub mod window;

pub use backpressure::{BackpressureCalculator, BackpressureConfig};
pub use bucket::{RetryAfterParams, RetryAfterStrategy, TokenBucket};
pub use config::{ClientKeyExtractor, RateLimiterConfig, RateLimiterConfigBuilder};
pub use error::RateLimiterError;
pub use events::RateLimiterEvent;
pub use layer::RateLimiterLayer;
pub use window::LatencyWindow;

use futures::future::BoxFuture;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;

/// The outcome of a single admission check, carrying everything needed to
/// render the response headers described by the HTTP surface.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether a token was successfully debited.
    pub allowed: bool,
    /// Configured burst limit (`RateLimit-Limit`).
    pub limit: u64,
    /// Tokens remaining after this decision, floored (`RateLimit-Remaining`).
    pub remaining: u64,
    /// Current backpressure score in `[0, 1]` (`X-Backpressure`).
    pub backpressure: f64,
    /// Advisory retry delay, populated on rejection.
    pub retry_after: std::time::Duration,
}

struct RateLimiterState {
    global: Mutex<TokenBucket>,
    clients: Option<Mutex<LruCache<String, TokenBucket>>>,
    window: Mutex<LatencyWindow>,
    backpressure: Mutex<BackpressureCalculator>,
}

impl RateLimiterState {
    fn new<Req>(config: &RateLimiterConfig<Req>) -> Self {
        let now = Instant::now();
        let clients = config.per_client_tracking_enabled().then(|| {
            let cap = NonZeroUsize::new(config.max_tracked_clients.max(1)).unwrap();
            Mutex::new(LruCache::new(cap))
        });
        Self {
            global: Mutex::new(TokenBucket::new(
                config.bucket_size,
                config.refill_rate(),
                now,
            )),
            clients,
            window: Mutex::new(LatencyWindow::new(config.window_size)),
            backpressure: Mutex::new(BackpressureCalculator::new(BackpressureConfig {
                p95_baseline: config.p95_baseline,
                min_latency: config.min_latency,
                min_samples: config.min_samples,
                gradient_sensitivity: config.gradient_sensitivity,
            })),
        }
    }

    /// Admits a request, debiting the global bucket and (if tracked) the
    /// client's sub-bucket. Both must have a token available; if either
    /// doesn't, neither is debited.
    fn try_acquire<Req>(
        &self,
        client_id: Option<&str>,
        config: &RateLimiterConfig<Req>,
    ) -> RateLimitDecision {
        let now = Instant::now();
        // Lock window, then backpressure, matching `record_latency`'s order to avoid deadlock.
        let b = {
            let window = self.window.lock().unwrap();
            self.backpressure.lock().unwrap().score(&window)
        };

        let mut global = self.global.lock().unwrap();
        global.refill(now);

        let mut clients_guard = self.clients.as_ref().map(|m| m.lock().unwrap());
        let client_bucket = match (&mut clients_guard, client_id) {
            (Some(clients), Some(id)) => {
                if clients.get_mut(id).is_none() {
                    clients.put(
                        id.to_string(),
                        TokenBucket::new(config.bucket_size, config.refill_rate(), now),
                    );
                }
                let bucket = clients.get_mut(id).unwrap();
                bucket.refill(now);
                Some(bucket)
            }
            _ => None,
        };

        let global_ready = global.has_token();
        let client_ready = match &client_bucket {
            Some(c) => c.has_token(),
            None => true,
        };

        if global_ready && client_ready {
            global.debit();
            let remaining = match &client_bucket {
                Some(c) => global.remaining().min(c.remaining()),
                None => global.remaining(),
            };
            if let Some(client) = client_bucket {
                client.debit();
            }
            return RateLimitDecision {
                allowed: true,
                limit: config.max_executions,
                remaining,
                backpressure: b,
                retry_after: std::time::Duration::ZERO,
            };
        }

        // Neither bucket is debited. The limiting bucket (fewer tokens) drives Retry-After.
        let limiting: &TokenBucket = match &client_bucket {
            Some(c) if c.tokens() < global.tokens() => c,
            _ => &global,
        };
        let retry_after =
            limiting.retry_after(config.retry_after_strategy, config.retry_after_params, b);
        let remaining = match &client_bucket {
            Some(c) => global.remaining().min(c.remaining()),
            None => global.remaining(),
        };

        RateLimitDecision {
            allowed: false,
            limit: config.max_executions,
            remaining,
            backpressure: b,
            retry_after,
        }
    }

    fn record_latency(&self, latency_secs: f64) -> Option<f64> {
        let mut window = self.window.lock().unwrap();
        window.push(latency_secs);
        if window.is_full() {
            let mut calc = self.backpressure.lock().unwrap();
            calc.adapt_baseline(&window);
            return Some(calc.p95_baseline());
        }
        None
    }
}

/// A Tower [`Service`] that applies token-bucket rate limiting.
pub struct RateLimiter<S, Req> {
    inner: S,
    config: Arc<RateLimiterConfig<Req>>,
    state: Arc<RateLimiterState>,
}

impl<S, Req> RateLimiter<S, Req> {
    /// Creates a new `RateLimiter` wrapping the given service.
    pub fn new(inner: S, config: Arc<RateLimiterConfig<Req>>) -> Self {
        let state = Arc::new(RateLimiterState::new(&config));
        Self {
            inner,
            config,
            state,
        }
    }
}

impl<S, Req> Clone for RateLimiter<S, Req>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S, Req> Service<Req> for RateLimiter<S, Req>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = RateLimiterError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(RateLimiterError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let client_id = self
            .config
            .client_key_extractor
            .as_ref()
            .and_then(|extract| extract(&req));
        let state = Arc::clone(&self.state);
        let config = Arc::clone(&self.config);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let decision = state.try_acquire(client_id.as_deref(), &config);

            if !decision.allowed {
                let event = RateLimiterEvent::PermitRejected {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    client_id: client_id.clone(),
                    retry_after: decision.retry_after,
                };
                config.event_listeners.emit(&event);
                return Err(RateLimiterError::RateLimitExceeded {
                    retry_after: decision.retry_after,
                });
            }

            let event = RateLimiterEvent::PermitAcquired {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                client_id: client_id.clone(),
                backpressure: decision.backpressure,
            };
            config.event_listeners.emit(&event);

            let start = Instant::now();
            let result = inner.call(req).await;
            let elapsed = start.elapsed().as_secs_f64();
            if let Some(new_baseline) = state.record_latency(elapsed) {
                config.event_listeners.emit(&RateLimiterEvent::BaselineAdapted {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    new_baseline,
                });
            }

            result.map_err(RateLimiterError::Inner)
        })
    }
}
