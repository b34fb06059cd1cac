use crate::backoff::{ExponentialBackoff, FixedInterval, IntervalFunction};
use crate::budget::RetryBudget;
use crate::events::RetryEvent;
use crate::policy::{RetryPolicy, RetryPredicate};
use resilience_core::events::{EventListeners, FnListener};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Source for determining the maximum number of retry attempts.
///
/// This enum allows configuring either a fixed max attempts for all requests
/// or a dynamic max attempts extracted from each request.
#[derive(Clone)]
pub enum MaxAttemptsSource<Req> {
    /// Fixed max attempts for all requests.
    Fixed(usize),
    /// Dynamic max attempts extracted from the request.
    ///
    /// The function receives a reference to the request and returns
    /// the max attempts to use for that specific request.
    Dynamic(Arc<dyn Fn(&Req) -> usize + Send + Sync>),
}

impl<Req> MaxAttemptsSource<Req> {
    /// Get the max attempts for a request.
    pub fn get_max_attempts(&self, req: &Req) -> usize {
        match self {
            MaxAttemptsSource::Fixed(n) => *n,
            MaxAttemptsSource::Dynamic(f) => f(req),
        }
    }
}

impl<Req> Default for MaxAttemptsSource<Req> {
    fn default() -> Self {
        MaxAttemptsSource::Fixed(3)
    }
}

/// Configuration for the retry middleware.
pub struct RetryConfig<Req, E> {
    pub(crate) policy: RetryPolicy<E>,
    pub(crate) max_attempts_source: MaxAttemptsSource<Req>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
    pub(crate) budget: Option<Arc<dyn RetryBudget>>,
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder<Req, E> {
    max_attempts_source: MaxAttemptsSource<Req>,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    retry_predicate: Option<RetryPredicate<E>>,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
    budget: Option<Arc<dyn RetryBudget>>,
    _phantom: PhantomData<Req>,
}

impl<Req, E> Default for RetryConfigBuilder<Req, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, E> RetryConfigBuilder<Req, E> {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_attempts: 3
    /// - backoff: full-jitter exponential with 100ms initial interval
    /// - name: `"<unnamed>"`
    /// - budget: None (unlimited retries)
    pub fn new() -> Self {
        Self {
            max_attempts_source: MaxAttemptsSource::default(),
            interval_fn: None,
            retry_predicate: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
            budget: None,
            _phantom: PhantomData,
        }
    }

    /// Sets a fixed maximum number of retry attempts for all requests.
    ///
    /// This includes the initial attempt, so max_attempts=3 means
    /// 1 initial attempt + 2 retries.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts_source = MaxAttemptsSource::Fixed(max_attempts.max(1));
        self
    }

    /// Sets a dynamic max attempts extractor function.
    ///
    /// The function receives a reference to the request and returns
    /// the maximum number of attempts to use for that specific request.
    /// This enables per-request retry configuration based on request properties.
    ///
    /// # Use Cases
    ///
    /// - Idempotent requests can retry more aggressively
    /// - Critical requests may have more retries
    /// - Different operations may have different retry budgets
    ///
    /// # Example
    ///
    /// ```rust
    /// use resilience_retry::RetryLayer;
    /// use std::time::Duration;
    ///
    /// #[derive(Clone)]
    /// struct MyRequest {
    ///     is_idempotent: bool,
    ///     // ... other fields
    /// }
    ///
    /// #[derive(Debug, Clone)]
    /// struct MyError;
    ///
    /// let layer = RetryLayer::<MyRequest, MyError>::builder()
    ///     .max_attempts_fn(|req: &MyRequest| {
    ///         if req.is_idempotent { 5 } else { 1 }
    ///     })
    ///     .exponential_backoff(Duration::from_millis(100))
    ///     .build();
    /// ```
    pub fn max_attempts_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Req) -> usize + Send + Sync + 'static,
    {
        self.max_attempts_source = MaxAttemptsSource::Dynamic(Arc::new(f));
        self
    }

    /// Sets a fixed backoff interval (no jitter).
    pub fn fixed_backoff(mut self, duration: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FixedInterval::new(duration)));
        self
    }

    /// Sets full-jitter exponential backoff: `min(max_delay, initial · 2^k) · Uniform(0.5, 1.5)`.
    pub fn exponential_backoff(mut self, initial_interval: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(initial_interval)));
        self
    }

    /// Sets a custom interval function for backoff.
    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Sets a predicate to determine which errors should be retried.
    ///
    /// Errors for which the predicate returns `false` are surfaced
    /// immediately via [`RetryError::Inner`](crate::RetryError::Inner),
    /// without consuming an attempt.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Sets the name for this retry instance (used in events).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Sets a retry budget to limit total retries across all requests.
    ///
    /// Retry budgets prevent retry storms by limiting the total number of
    /// retries that can occur, regardless of how many concurrent requests
    /// are being processed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use resilience_retry::{RetryLayer, RetryBudgetBuilder};
    /// use std::time::Duration;
    ///
    /// // Create a token bucket budget: 10 retries/sec, max burst of 100
    /// let budget = RetryBudgetBuilder::new()
    ///     .token_bucket()
    ///     .tokens_per_second(10.0)
    ///     .max_tokens(100)
    ///     .build();
    ///
    /// let layer = RetryLayer::<(), std::io::Error>::builder()
    ///     .max_attempts(5)
    ///     .exponential_backoff(Duration::from_millis(100))
    ///     .budget(budget)
    ///     .build();
    /// ```
    pub fn budget(mut self, budget: Arc<dyn RetryBudget>) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Registers a callback when a retry is skipped due to budget exhaustion.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the attempt number that was skipped.
    pub fn on_budget_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::BudgetExhausted { attempt, .. } = event {
                f(*attempt);
            }
        }));
        self
    }

    /// Registers a callback when a retry attempt is about to be made.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration)` - attempt number (1-indexed) and the delay before it.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback when an operation succeeds.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - total number of attempts made (including the initial one).
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when all retry attempts are exhausted.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - total number of attempts made before giving up.
    pub fn on_attempts_exceeded<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::AttemptsExceeded { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when an error is ignored and not retried.
    ///
    /// # Callback Signature
    /// `Fn()` - called with no parameters when an error is ignored.
    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, RetryEvent::IgnoredError { .. }) {
                f();
            }
        }));
        self
    }

    /// Builds the retry layer.
    pub fn build(self) -> crate::RetryLayer<Req, E> {
        let interval_fn = self
            .interval_fn
            .unwrap_or_else(|| Arc::new(ExponentialBackoff::new(Duration::from_millis(100))));

        let mut policy = RetryPolicy::new(interval_fn);
        if let Some(predicate) = self.retry_predicate {
            policy.retry_predicate = Some(predicate);
        }

        let config = RetryConfig {
            policy,
            max_attempts_source: self.max_attempts_source,
            event_listeners: self.event_listeners,
            name: self.name,
            budget: self.budget,
        };

        crate::RetryLayer::new(config)
    }
}
