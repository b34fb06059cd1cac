use resilience_bulkhead::{BulkheadConfig, BulkheadError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{Layer, Service, service_fn};

#[tokio::test]
async fn default_builder_admits_well_above_a_handful_of_concurrent_calls() {
    // Defaults are generous (25 concurrent, 25 queued); a handful of quick
    // calls should all succeed without ever seeing BulkheadFull.
    let layer = BulkheadConfig::builder().build();
    let service = service_fn(|_req: ()| async { Ok::<_, &'static str>(()) });
    let mut bh = layer.layer(service);

    for _ in 0..10 {
        assert!(bh.call(()).await.is_ok());
    }
}

#[tokio::test]
async fn max_concurrent_calls_of_zero_is_floored_at_one_not_zero() {
    // Flooring to zero would make the bulkhead permanently unusable.
    let layer = BulkheadConfig::builder().max_concurrent_calls(0).build();
    let service = service_fn(|_req: ()| async { Ok::<_, &'static str>(()) });
    let mut bh = layer.layer(service);

    assert!(bh.call(()).await.is_ok());
}

#[tokio::test]
async fn reject_when_full_rejects_a_second_concurrent_call_outright() {
    let layer = BulkheadConfig::builder()
        .max_concurrent_calls(1)
        .reject_when_full()
        .build();
    let service = service_fn(|_req: ()| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, &'static str>(())
    });
    let bh = layer.layer(service);

    let mut first = bh.clone();
    let held = tokio::spawn(async move { first.call(()).await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let mut second = bh.clone();
    match second.call(()).await {
        Err(BulkheadError::BulkheadFull { max_queued, .. }) => assert_eq!(max_queued, 0),
        other => panic!("expected BulkheadFull, got {other:?}"),
    }

    held.await.unwrap().unwrap();
}

#[tokio::test]
async fn on_call_permitted_listener_fires_for_every_admitted_call() {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);

    let layer = BulkheadConfig::builder()
        .max_concurrent_calls(4)
        .on_call_permitted(move |_concurrent| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let service = service_fn(|_req: ()| async { Ok::<_, &'static str>(()) });
    let mut bh = layer.layer(service);

    for _ in 0..4 {
        bh.call(()).await.unwrap();
    }

    assert_eq!(count.load(Ordering::SeqCst), 4);
}
