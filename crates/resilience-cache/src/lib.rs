//! Response caching middleware for Tower services.
//!
//! This crate provides a Tower middleware for caching service responses,
//! reducing load on downstream services by storing and reusing responses
//! for identical requests.
//!
//! # Features
//!
//! - **LRU Eviction**: Least Recently Used eviction policy
//! - **TTL Support**: Optional time-to-live for cache entries
//! - **Single-Flight Coalescing**: Concurrent misses for the same key share
//!   one call to the wrapped service
//! - **Event System**: Observability through cache events (Hit, Miss,
//!   Coalesced, Eviction)
//! - **Flexible Key Extraction**: User-defined key extraction from requests
//!
//! # Examples
//!
//! ```
//! use resilience_cache::CacheLayer;
//! use tower::ServiceBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a cache layer
//! let cache_layer = CacheLayer::builder()
//!     .max_size(100)
//!     .ttl(Duration::from_secs(60))
//!     .key_extractor(|req: &String| req.clone())
//!     .on_hit(|| println!("Cache hit!"))
//!     .on_miss(|| println!("Cache miss!"))
//!     .build();
//!
//! // Apply to a service
//! let service = ServiceBuilder::new()
//!     .layer(cache_layer)
//!     .service(tower::service_fn(|req: String| async move {
//!         Ok::<_, std::io::Error>(format!("Response: {}", req))
//!     }));
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod events;
mod layer;
mod store;

pub use config::{CacheConfig, CacheConfigBuilder, KeyExtractor};
pub use error::CacheError;
pub use events::CacheEvent;
pub use layer::CacheLayer;

use futures::future::BoxFuture;
use hashbrown::HashMap;
use parking_lot::Mutex as SyncMutex;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Instant;
use store::CacheStore;
use tokio::sync::broadcast;
use tower::Service;

/// Tracks computations currently in flight for a key, so concurrent misses
/// for the same key share a single call to the wrapped service.
struct InFlight<K, Resp, Err> {
    leaders: SyncMutex<HashMap<K, broadcast::Sender<Result<Resp, Err>>>>,
}

impl<K, Resp, Err> InFlight<K, Resp, Err>
where
    K: Hash + Eq + Clone,
    Resp: Clone,
    Err: Clone,
{
    fn new() -> Self {
        Self {
            leaders: SyncMutex::new(HashMap::new()),
        }
    }

    /// Attempts to join an in-flight computation for `key`. Returns `None`
    /// if there is none, in which case the caller becomes the leader.
    fn join(&self, key: &K) -> Option<broadcast::Receiver<Result<Resp, Err>>> {
        let mut leaders = self.leaders.lock();
        if let Some(sender) = leaders.get(key) {
            Some(sender.subscribe())
        } else {
            let (tx, _rx) = broadcast::channel(1);
            leaders.insert(key.clone(), tx);
            None
        }
    }

    /// Removes the leader entry for `key` and broadcasts the result to
    /// every waiter that joined it.
    fn complete(&self, key: &K, result: Result<Resp, Err>) {
        let mut leaders = self.leaders.lock();
        if let Some(sender) = leaders.remove(key) {
            let _ = sender.send(result);
        }
    }

    /// Removes the leader entry for `key` without sending a result. Used
    /// when a leader's future is dropped before completing, so waiters
    /// see the channel close instead of hanging forever.
    fn abandon(&self, key: &K) {
        let mut leaders = self.leaders.lock();
        leaders.remove(key);
    }
}

/// Drops the leader entry for a key if the leader's future is cancelled
/// before it reports a result.
struct LeaderGuard<K, Resp, Err>
where
    K: Hash + Eq + Clone,
    Resp: Clone,
    Err: Clone,
{
    in_flight: Arc<InFlight<K, Resp, Err>>,
    key: Option<K>,
}

impl<K, Resp, Err> Drop for LeaderGuard<K, Resp, Err>
where
    K: Hash + Eq + Clone,
    Resp: Clone,
    Err: Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.in_flight.abandon(&key);
        }
    }
}

/// A Tower [`Service`] that caches responses.
///
/// This service wraps an inner service and caches successful responses.
/// When a request comes in, the cache checks if a valid cached response
/// exists. If so, it returns the cached value immediately without calling
/// the inner service. A miss that lands while another request for the same
/// key is already in flight joins that computation instead of starting a
/// second one.
///
/// Responses must implement `Clone` to be cacheable.
pub struct Cache<S, Req, K, Resp, Err> {
    inner: S,
    config: Arc<CacheConfig<Req, K>>,
    store: Arc<Mutex<CacheStore<K, Resp>>>,
    in_flight: Arc<InFlight<K, Resp, Err>>,
}

impl<S, Req, K, Resp, Err> Cache<S, Req, K, Resp, Err>
where
    K: Hash + Eq,
    Resp: Clone,
    Err: Clone,
{
    /// Creates a new `Cache` wrapping the given service.
    pub fn new(inner: S, config: Arc<CacheConfig<Req, K>>) -> Self {
        let store = Arc::new(Mutex::new(CacheStore::new(config.max_size, config.ttl)));
        Self {
            inner,
            config,
            store,
            in_flight: Arc::new(InFlight::new()),
        }
    }
}

impl<S, Req, K, Resp, Err> Clone for Cache<S, Req, K, Resp, Err>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<S, Req, K> Service<Req> for Cache<S, Req, K, S::Response, S::Error>
where
    S: Service<Req>,
    S::Response: Clone + Send + 'static,
    S::Error: Clone + Send + 'static,
    K: Hash + Eq + Clone + Send + 'static,
    Req: Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = CacheError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(CacheError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let key = (self.config.key_extractor)(&req);

        let cached = {
            let mut store = self.store.lock().unwrap();
            store.get(&key)
        };

        if let Some(response) = cached {
            let event = CacheEvent::Hit {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
            };
            self.config.event_listeners.emit(&event);
            return Box::pin(async move { Ok(response) });
        }

        if let Some(mut receiver) = self.in_flight.join(&key) {
            let event = CacheEvent::Coalesced {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
            };
            self.config.event_listeners.emit(&event);

            return Box::pin(async move {
                match receiver.recv().await {
                    Ok(result) => result.map_err(CacheError::Inner),
                    Err(_) => Err(CacheError::LeaderDropped),
                }
            });
        }

        let miss_event = CacheEvent::Miss {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
        };
        self.config.event_listeners.emit(&miss_event);

        let future = self.inner.call(req);
        let store = Arc::clone(&self.store);
        let config = Arc::clone(&self.config);
        let in_flight = Arc::clone(&self.in_flight);
        let guard = LeaderGuard {
            in_flight: Arc::clone(&in_flight),
            key: Some(key.clone()),
        };

        Box::pin(async move {
            let guard = guard;
            let result = future.await;

            if let Ok(response) = &result {
                let was_full = {
                    let mut store = store.lock().unwrap();
                    let was_full = store.len() >= config.max_size;
                    store.insert(key.clone(), response.clone());
                    was_full
                };
                if was_full {
                    let event = CacheEvent::Eviction {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                    };
                    config.event_listeners.emit(&event);
                }
            }

            in_flight.complete(&key, result.clone());
            drop(guard);

            result.map_err(CacheError::Inner)
        })
    }
}
