//! Backoff strategy tests for resilience-retry.
//!
//! Tests different backoff behaviors including:
//! - Fixed interval consistency
//! - Full-jitter exponential growth
//! - Equal-jitter exponential variance bounds
//! - Custom function intervals

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tower::{Layer, Service, ServiceExt};
use resilience_retry::{ExponentialBackoff, ExponentialRandomBackoff, FixedInterval, FnInterval, RetryLayer};

#[derive(Debug, Clone)]
struct TestError;

#[tokio::test]
async fn fixed_interval_consistent_delays() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);
    let timestamps = Arc::new(std::sync::Mutex::new(Vec::new()));
    let ts = Arc::clone(&timestamps);

    let service = tower::service_fn(move |_req: String| {
        let cc = Arc::clone(&cc);
        let ts = Arc::clone(&ts);
        async move {
            ts.lock().unwrap().push(Instant::now());
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count < 3 {
                Err(TestError)
            } else {
                Ok::<_, TestError>("success".to_string())
            }
        }
    });

    let layer = RetryLayer::<String, TestError>::builder()
        .max_attempts(5)
        .backoff(FixedInterval::new(Duration::from_millis(50)))
        .build();

    let mut service = layer.layer(service);

    let _ = service
        .ready()
        .await
        .unwrap()
        .call("test".to_string())
        .await;

    let times = timestamps.lock().unwrap();
    assert_eq!(times.len(), 4); // 1 initial + 3 retries

    for i in 1..times.len() {
        let delay = times[i].duration_since(times[i - 1]);
        assert!(
            delay >= Duration::from_millis(20) && delay <= Duration::from_millis(80),
            "Expected delay around 50ms, got {:?} at attempt {}",
            delay,
            i
        );
    }
}

#[tokio::test]
async fn exponential_backoff_stays_within_full_jitter_bounds() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);
    let timestamps = Arc::new(std::sync::Mutex::new(Vec::new()));
    let ts = Arc::clone(&timestamps);

    let service = tower::service_fn(move |_req: String| {
        let cc = Arc::clone(&cc);
        let ts = Arc::clone(&ts);
        async move {
            ts.lock().unwrap().push(Instant::now());
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count < 3 {
                Err(TestError)
            } else {
                Ok::<_, TestError>("success".to_string())
            }
        }
    });

    let layer = RetryLayer::<String, TestError>::builder()
        .max_attempts(5)
        .backoff(ExponentialBackoff::new(Duration::from_millis(50)))
        .build();

    let mut service = layer.layer(service);

    let _ = service
        .ready()
        .await
        .unwrap()
        .call("test".to_string())
        .await;

    let times = timestamps.lock().unwrap();
    assert_eq!(times.len(), 4);

    // Full jitter means each delay lands in [0.5x, 1.5x] of 50 * 2^attempt.
    let bounds = [(20, 80), (35, 155), (70, 310)];
    for (i, (lo, hi)) in bounds.iter().enumerate() {
        let delay = times[i + 1].duration_since(times[i]);
        assert!(
            delay >= Duration::from_millis(*lo) && delay <= Duration::from_millis(*hi),
            "attempt {}: expected within [{},{}]ms, got {:?}",
            i,
            lo,
            hi,
            delay
        );
    }
}

#[tokio::test]
async fn exponential_backoff_respects_max_delay_cap() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);
    let timestamps = Arc::new(std::sync::Mutex::new(Vec::new()));
    let ts = Arc::clone(&timestamps);

    let service = tower::service_fn(move |_req: String| {
        let cc = Arc::clone(&cc);
        let ts = Arc::clone(&ts);
        async move {
            ts.lock().unwrap().push(Instant::now());
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count < 4 {
                Err(TestError)
            } else {
                Ok::<_, TestError>("success".to_string())
            }
        }
    });

    let layer = RetryLayer::<String, TestError>::builder()
        .max_attempts(6)
        .backoff(
            ExponentialBackoff::new(Duration::from_millis(50))
                .with_max_delay(Duration::from_millis(100)),
        )
        .build();

    let mut service = layer.layer(service);

    let _ = service
        .ready()
        .await
        .unwrap()
        .call("test".to_string())
        .await;

    let times = timestamps.lock().unwrap();
    assert_eq!(times.len(), 5);

    // By the third retry the uncapped delay (200ms) would exceed the 100ms
    // cap, so even with full jitter the wait should stay well under it.
    let delay3 = times[3].duration_since(times[2]);
    assert!(
        delay3 <= Duration::from_millis(200),
        "Third delay should be capped, got {:?}",
        delay3
    );
}

#[tokio::test]
async fn exponential_random_backoff_never_drops_below_half() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);
    let timestamps = Arc::new(std::sync::Mutex::new(Vec::new()));
    let ts = Arc::clone(&timestamps);

    let service = tower::service_fn(move |_req: String| {
        let cc = Arc::clone(&cc);
        let ts = Arc::clone(&ts);
        async move {
            ts.lock().unwrap().push(Instant::now());
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                Err(TestError)
            } else {
                Ok::<_, TestError>("success".to_string())
            }
        }
    });

    let layer = RetryLayer::<String, TestError>::builder()
        .max_attempts(4)
        .backoff(ExponentialRandomBackoff::new(Duration::from_millis(100)))
        .build();

    let mut service = layer.layer(service);

    let _ = service
        .ready()
        .await
        .unwrap()
        .call("test".to_string())
        .await;

    let times = timestamps.lock().unwrap();
    let delay = times[1].duration_since(times[0]);
    assert!(
        delay >= Duration::from_millis(40) && delay <= Duration::from_millis(110),
        "equal-jitter delay out of range: {:?}",
        delay
    );
}

#[tokio::test]
async fn custom_function_interval_linear_growth() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);
    let timestamps = Arc::new(std::sync::Mutex::new(Vec::new()));
    let ts = Arc::clone(&timestamps);

    let service = tower::service_fn(move |_req: String| {
        let cc = Arc::clone(&cc);
        let ts = Arc::clone(&ts);
        async move {
            ts.lock().unwrap().push(Instant::now());
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count < 3 {
                Err(TestError)
            } else {
                Ok::<_, TestError>("success".to_string())
            }
        }
    });

    let layer = RetryLayer::<String, TestError>::builder()
        .max_attempts(5)
        .backoff(FnInterval::new(|attempt| {
            Duration::from_millis(50 * (attempt as u64 + 1))
        }))
        .build();

    let mut service = layer.layer(service);

    let _ = service
        .ready()
        .await
        .unwrap()
        .call("test".to_string())
        .await;

    let times = timestamps.lock().unwrap();
    assert_eq!(times.len(), 4);

    let delay1 = times[1].duration_since(times[0]);
    assert!(delay1 >= Duration::from_millis(20) && delay1 <= Duration::from_millis(80));

    let delay2 = times[2].duration_since(times[1]);
    assert!(delay2 >= Duration::from_millis(70) && delay2 <= Duration::from_millis(130));
}

#[tokio::test]
async fn zero_backoff_retries_immediately() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    let service = tower::service_fn(move |_req: String| {
        let cc = Arc::clone(&cc);
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                Err(TestError)
            } else {
                Ok::<_, TestError>("success".to_string())
            }
        }
    });

    let layer = RetryLayer::<String, TestError>::builder()
        .max_attempts(4)
        .backoff(FixedInterval::new(Duration::from_millis(0)))
        .build();

    let mut service = layer.layer(service);

    let start = Instant::now();
    let _ = service
        .ready()
        .await
        .unwrap()
        .call("test".to_string())
        .await;
    let elapsed = start.elapsed();

    assert!(
        elapsed < Duration::from_millis(50),
        "Zero backoff should complete quickly, took {:?}",
        elapsed
    );
    assert_eq!(call_count.load(Ordering::SeqCst), 3);
}
