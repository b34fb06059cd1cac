use resilience_circuitbreaker::{CircuitBreakerError, CircuitBreakerLayer, CircuitState};
use std::future::Future;
use std::pin::Pin;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service, ServiceBuilder};

#[derive(Clone)]
struct FlakyService {
    fail_after: usize,
    counter: Arc<AtomicUsize>,
}

impl FlakyService {
    fn new(fail_after: usize) -> Self {
        Self {
            fail_after,
            counter: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Service<()> for FlakyService {
    type Response = &'static str;
    type Error = &'static str;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: ()) -> Self::Future {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        let should_fail = count >= self.fail_after;
        Box::pin(async move { if should_fail { Err("fail") } else { Ok("ok") } })
    }
}

#[tokio::test]
async fn circuit_opens_after_consecutive_failures() {
    let service = FlakyService::new(0);

    let layer = CircuitBreakerLayer::builder()
        .failure_threshold(3)
        .recovery_timeout(Duration::from_secs(60))
        .name("integration-basic")
        .build();

    let mut cb = layer.layer(service);

    for _ in 0..3 {
        assert!(cb.call(()).await.is_err());
    }

    assert_eq!(cb.state().await, CircuitState::Open);

    match cb.call(()).await {
        Err(CircuitBreakerError::CircuitOpen { name }) => {
            assert_eq!(name.as_deref(), Some("integration-basic"));
        }
        other => panic!("expected CircuitOpen, got {other:?}"),
    }
}

#[tokio::test]
async fn closed_circuit_passes_successes_through_untouched() {
    let service = FlakyService::new(100);

    let layer = CircuitBreakerLayer::builder()
        .failure_threshold(3)
        .build();

    let mut cb = layer.layer(service);

    for _ in 0..10 {
        assert_eq!(cb.call(()).await, Ok("ok"));
    }

    assert_eq!(cb.state().await, CircuitState::Closed);
}

#[tokio::test]
async fn works_composed_inside_a_service_builder_stack() {
    let service = FlakyService::new(0);

    let layer = CircuitBreakerLayer::builder().failure_threshold(2).build();

    let mut stack = ServiceBuilder::new().layer(layer).service(service);

    assert!(stack.call(()).await.is_err());
    assert!(stack.call(()).await.is_err());

    match stack.call(()).await {
        Err(CircuitBreakerError::CircuitOpen { .. }) => {}
        other => panic!("expected CircuitOpen, got {other:?}"),
    }
}

#[tokio::test]
async fn inner_errors_pass_through_as_inner_variant() {
    let service = FlakyService::new(0);
    let layer = CircuitBreakerLayer::builder().failure_threshold(100).build();
    let mut cb = layer.layer(service);

    match cb.call(()).await {
        Err(CircuitBreakerError::Inner(e)) => assert_eq!(e, "fail"),
        other => panic!("expected Inner, got {other:?}"),
    }
}
