use resilience_circuitbreaker::{CircuitBreakerLayer, CircuitState};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;
use tower::{Layer, Service, service_fn};

#[tokio::test]
async fn concurrent_failures_trip_the_circuit_exactly_once() {
    let service = service_fn(|_req: ()| async { Err::<(), _>("boom") });

    let layer = CircuitBreakerLayer::builder().failure_threshold(50).build();
    let cb = layer.layer(service);

    let mut handles = Vec::new();
    for _ in 0..100 {
        let mut cb = cb.clone();
        handles.push(tokio::spawn(async move { cb.call(()).await }));
    }

    for handle in handles {
        let _ = handle.await.unwrap();
    }

    assert_eq!(cb.state().await, CircuitState::Open);
}

#[tokio::test]
async fn only_the_configured_number_of_half_open_probes_reach_the_inner_service() {
    let admitted = Arc::new(AtomicUsize::new(0));
    let should_fail = Arc::new(AtomicUsize::new(1));
    let a = Arc::clone(&admitted);
    let f = Arc::clone(&should_fail);
    let service = service_fn(move |_req: ()| {
        a.fetch_add(1, Ordering::Relaxed);
        let fail = f.load(Ordering::Relaxed) == 1;
        async move {
            if fail {
                Err::<(), _>("boom")
            } else {
                Ok(())
            }
        }
    });

    let layer = CircuitBreakerLayer::builder()
        .failure_threshold(1)
        .recovery_timeout(Duration::from_millis(20))
        .half_open_requests(5)
        .build();

    let mut cb = layer.layer(service);
    assert!(cb.call(()).await.is_err());

    should_fail.store(0, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(30)).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let mut cb = cb.clone();
        handles.push(tokio::spawn(async move { cb.call(()).await }));
    }
    for handle in handles {
        let _ = handle.await.unwrap();
    }

    assert!(admitted.load(Ordering::Relaxed) <= 5);
}

#[tokio::test]
async fn state_reads_never_panic_under_concurrent_writers() {
    let service = service_fn(|_req: ()| async { Ok::<_, &'static str>(()) });
    let layer = CircuitBreakerLayer::builder().failure_threshold(10).build();
    let cb = layer.layer(service);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let mut cb = cb.clone();
        handles.push(tokio::spawn(async move {
            let _ = cb.call(()).await;
        }));
    }
    for _ in 0..50 {
        let cb = cb.clone();
        handles.push(tokio::spawn(async move {
            let _ = cb.state_sync();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}
