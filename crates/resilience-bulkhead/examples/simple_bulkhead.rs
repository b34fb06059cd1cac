use resilience_bulkhead::BulkheadConfig;
use std::convert::Infallible;
use std::time::Duration;
use tower::{Service, ServiceBuilder, ServiceExt};

#[tokio::main]
async fn main() {
    println!("Simple Bulkhead Example\n");

    // Allow 5 concurrent calls, queue up to 2 more before rejecting.
    let layer = BulkheadConfig::builder()
        .max_concurrent_calls(5)
        .max_queued(2)
        .name("api-bulkhead")
        .build();

    let service = tower::service_fn(|req: String| async move {
        println!("Processing: {}", req);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, Infallible>(format!("Response to: {}", req))
    });

    let mut bulkhead_service = ServiceBuilder::new().layer(layer).service(service);

    for i in 1..=3 {
        match bulkhead_service.ready().await {
            Ok(svc) => {
                let response = svc.call(format!("Request {}", i)).await.unwrap();
                println!("{}", response);
            }
            Err(e) => {
                println!("Error: {}", e);
            }
        }
    }

    println!("\nAll requests completed!");
}
