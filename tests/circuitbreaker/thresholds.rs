use resilience_circuitbreaker::{CircuitBreakerLayer, CircuitState};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tower::{Layer, Service, service_fn};

fn always_failing() -> impl Service<(), Response = (), Error = &'static str, Future = impl Send> + Clone
{
    service_fn(|_: ()| async { Err::<(), _>("boom") })
}

#[tokio::test]
async fn threshold_of_one_trips_on_first_failure() {
    let layer = CircuitBreakerLayer::builder().failure_threshold(1).build();
    let mut cb = layer.layer(always_failing());

    assert!(cb.call(()).await.is_err());
    assert_eq!(cb.state().await, CircuitState::Open);
}

#[tokio::test]
async fn stays_closed_one_failure_short_of_threshold() {
    let layer = CircuitBreakerLayer::builder().failure_threshold(5).build();
    let mut cb = layer.layer(always_failing());

    for _ in 0..4 {
        let _ = cb.call(()).await;
    }

    assert_eq!(cb.state().await, CircuitState::Closed);
}

#[tokio::test]
async fn trips_exactly_on_the_nth_failure() {
    let layer = CircuitBreakerLayer::builder().failure_threshold(5).build();
    let mut cb = layer.layer(always_failing());

    for _ in 0..5 {
        let _ = cb.call(()).await;
    }

    assert_eq!(cb.state().await, CircuitState::Open);
}

#[tokio::test]
async fn an_interleaved_success_resets_the_consecutive_counter() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&call_count);

    // Fails 4 times, succeeds once, fails 4 more: never hits 5 consecutive failures.
    let service = service_fn(move |_req: ()| {
        let n = c.fetch_add(1, Ordering::Relaxed);
        async move {
            if n == 4 {
                Ok::<_, &'static str>(())
            } else {
                Err("boom")
            }
        }
    });

    let layer = CircuitBreakerLayer::builder().failure_threshold(5).build();
    let mut cb = layer.layer(service);

    for _ in 0..9 {
        let _ = cb.call(()).await;
    }

    assert_eq!(cb.state().await, CircuitState::Closed);
}

#[tokio::test]
async fn failure_threshold_of_zero_is_floored_to_one() {
    let layer = CircuitBreakerLayer::builder().failure_threshold(0).build();
    let mut cb = layer.layer(always_failing());

    assert!(cb.call(()).await.is_err());
    assert_eq!(cb.state().await, CircuitState::Open);
}

#[tokio::test]
async fn half_open_requests_of_zero_is_floored_to_one() {
    use std::time::Duration;

    let layer = CircuitBreakerLayer::builder()
        .failure_threshold(1)
        .recovery_timeout(Duration::from_millis(20))
        .half_open_requests(0)
        .build();

    let mut cb = layer.layer(always_failing());
    assert!(cb.call(()).await.is_err());
    assert_eq!(cb.state().await, CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(cb.call(()).await.is_err());
    assert_eq!(cb.state().await, CircuitState::Open);
}
