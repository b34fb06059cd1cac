//! Tower layer implementation for bulkhead.

use crate::config::BulkheadConfig;
use crate::service::Bulkhead;
use std::sync::Arc;
use tower::Layer;

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge, describe_histogram};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Layer that applies bulkhead concurrency limiting.
#[derive(Clone)]
pub struct BulkheadLayer {
    config: Arc<BulkheadConfig>,
}

impl BulkheadLayer {
    pub(crate) fn new(config: BulkheadConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BulkheadConfig {
        &self.config
    }

    /// Creates a new builder for configuring a bulkhead layer.
    ///
    /// ```
    /// use resilience_bulkhead::BulkheadLayer;
    /// use std::time::Duration;
    ///
    /// let layer = BulkheadLayer::builder()
    ///     .max_concurrent_calls(10)
    ///     .max_queued(20)
    ///     .max_wait_duration(Some(Duration::from_secs(5)))
    ///     .build();
    /// ```
    pub fn builder() -> crate::BulkheadConfigBuilder {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "bulkhead_calls_permitted_total",
                    "Total number of calls permitted through the bulkhead"
                );
                describe_counter!(
                    "bulkhead_calls_rejected_total",
                    "Total number of calls rejected by the bulkhead"
                );
                describe_counter!(
                    "bulkhead_calls_finished_total",
                    "Total number of calls that finished successfully"
                );
                describe_counter!(
                    "bulkhead_calls_failed_total",
                    "Total number of calls that failed"
                );
                describe_gauge!(
                    "bulkhead_concurrent_calls",
                    "Current number of concurrent calls"
                );
                describe_gauge!("bulkhead_queued_calls", "Current number of queued calls");
                describe_histogram!(
                    "bulkhead_wait_duration_seconds",
                    "Time spent waiting to acquire a permit"
                );
                describe_histogram!(
                    "bulkhead_call_duration_seconds",
                    "Duration of calls through the bulkhead"
                );
            });
        }
        crate::BulkheadConfigBuilder::new()
    }

    /// Preset: small bulkhead, rejects immediately once 10 calls are in flight.
    pub fn small() -> crate::BulkheadConfigBuilder {
        Self::builder().max_concurrent_calls(10).reject_when_full()
    }

    /// Preset: medium bulkhead, rejects immediately once 50 calls are in flight.
    pub fn medium() -> crate::BulkheadConfigBuilder {
        Self::builder().max_concurrent_calls(50).reject_when_full()
    }

    /// Preset: large bulkhead, rejects immediately once 200 calls are in flight.
    pub fn large() -> crate::BulkheadConfigBuilder {
        Self::builder().max_concurrent_calls(200).reject_when_full()
    }
}

impl<S> Layer<S> for BulkheadLayer {
    type Service = Bulkhead<S>;

    fn layer(&self, service: S) -> Self::Service {
        Bulkhead::new(service, Arc::clone(&self.config))
    }
}
