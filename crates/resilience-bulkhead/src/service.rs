//! Bulkhead service implementation.

use crate::config::BulkheadConfig;
use crate::error::BulkheadError;
use crate::events::BulkheadEvent;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::Semaphore;
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// A caller's place in the wait queue. Decrements the queued-call count on
/// drop, whether it resolves normally or is cancelled mid-wait.
struct QueueSlot {
    queued: Arc<AtomicUsize>,
}

impl Drop for QueueSlot {
    fn drop(&mut self) {
        self.queued.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Bulkhead service: admits up to `max_concurrent_calls` at once, queues up
/// to `max_queued` more in FIFO order, and rejects the rest.
pub struct Bulkhead<S> {
    inner: S,
    semaphore: Arc<Semaphore>,
    queued: Arc<AtomicUsize>,
    config: Arc<BulkheadConfig>,
}

impl<S: Clone> Clone for Bulkhead<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            semaphore: Arc::clone(&self.semaphore),
            queued: Arc::clone(&self.queued),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> Bulkhead<S> {
    pub(crate) fn new(inner: S, config: Arc<BulkheadConfig>) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_calls));
        Self {
            inner,
            semaphore,
            queued: Arc::new(AtomicUsize::new(0)),
            config,
        }
    }
}

impl<S, Request> Service<Request> for Bulkhead<S>
where
    S: Service<Request> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = BulkheadError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(BulkheadError::Inner)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let semaphore = Arc::clone(&self.semaphore);
        let queued = Arc::clone(&self.queued);
        let config = Arc::clone(&self.config);
        let mut inner = self.inner.clone();
        let start_time = Instant::now();

        Box::pin(async move {
            let permit = match Arc::clone(&semaphore).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    let already_queued = queued.fetch_add(1, Ordering::AcqRel);
                    if already_queued >= config.max_queued {
                        queued.fetch_sub(1, Ordering::AcqRel);
                        return Err(reject_full(&config));
                    }

                    let slot = QueueSlot {
                        queued: Arc::clone(&queued),
                    };
                    let event = BulkheadEvent::CallQueued {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        queued_calls: already_queued + 1,
                    };
                    config.event_listeners.emit(&event);
                    #[cfg(feature = "metrics")]
                    gauge!("bulkhead_queued_calls", "bulkhead" => config.name.clone())
                        .set((already_queued + 1) as f64);

                    let acquired = match config.max_wait_duration {
                        Some(duration) => {
                            tokio::time::timeout(duration, Arc::clone(&semaphore).acquire_owned())
                                .await
                        }
                        None => Ok(Arc::clone(&semaphore).acquire_owned().await),
                    };
                    drop(slot);

                    match acquired {
                        Ok(Ok(permit)) => permit,
                        Ok(Err(_)) => return Err(reject_full(&config)),
                        Err(_) => {
                            let event = BulkheadEvent::CallRejected {
                                pattern_name: config.name.clone(),
                                timestamp: Instant::now(),
                                max_concurrent_calls: config.max_concurrent_calls,
                            };
                            config.event_listeners.emit(&event);
                            #[cfg(feature = "metrics")]
                            counter!("bulkhead_calls_rejected_total", "bulkhead" => config.name.clone())
                                .increment(1);
                            return Err(BulkheadError::Timeout);
                        }
                    }
                }
            };

            let concurrent_calls = config.max_concurrent_calls - semaphore.available_permits();
            let event = BulkheadEvent::CallPermitted {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                concurrent_calls,
            };
            config.event_listeners.emit(&event);
            #[cfg(feature = "metrics")]
            {
                counter!("bulkhead_calls_permitted_total", "bulkhead" => config.name.clone())
                    .increment(1);
                gauge!("bulkhead_concurrent_calls", "bulkhead" => config.name.clone())
                    .set(concurrent_calls as f64);
            }

            let result = inner.call(request).await;
            drop(permit);

            let duration = start_time.elapsed();
            match &result {
                Ok(_) => {
                    let event = BulkheadEvent::CallFinished {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        duration,
                    };
                    config.event_listeners.emit(&event);
                    #[cfg(feature = "metrics")]
                    counter!("bulkhead_calls_finished_total", "bulkhead" => config.name.clone())
                        .increment(1);
                }
                Err(_) => {
                    let event = BulkheadEvent::CallFailed {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        duration,
                    };
                    config.event_listeners.emit(&event);
                    #[cfg(feature = "metrics")]
                    counter!("bulkhead_calls_failed_total", "bulkhead" => config.name.clone())
                        .increment(1);
                }
            }

            #[cfg(feature = "metrics")]
            gauge!("bulkhead_concurrent_calls", "bulkhead" => config.name.clone())
                .set((config.max_concurrent_calls - semaphore.available_permits()) as f64);

            result.map_err(BulkheadError::Inner)
        })
    }
}

fn reject_full<E>(config: &BulkheadConfig) -> BulkheadError<E> {
    let event = BulkheadEvent::CallRejected {
        pattern_name: config.name.clone(),
        timestamp: Instant::now(),
        max_concurrent_calls: config.max_concurrent_calls,
    };
    config.event_listeners.emit(&event);
    #[cfg(feature = "metrics")]
    counter!("bulkhead_calls_rejected_total", "bulkhead" => config.name.clone()).increment(1);

    BulkheadError::BulkheadFull {
        max_concurrent_calls: config.max_concurrent_calls,
        max_queued: config.max_queued,
    }
}
