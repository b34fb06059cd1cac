//! LRU cache storage with TTL expiration.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Entry in the cache with TTL tracking.
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => self.inserted_at.elapsed() > ttl,
            None => false,
        }
    }
}

/// LRU cache store with TTL support.
///
/// A lookup that finds an expired entry evicts it and reports a miss, same
/// as finding nothing at all.
pub(crate) struct CacheStore<K: Hash + Eq, V> {
    entries: LruCache<K, CacheEntry<V>>,
    ttl: Option<Duration>,
}

impl<K: Hash + Eq, V: Clone> CacheStore<K, V> {
    pub(crate) fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Gets a value from the cache if it exists and is not expired. A hit
    /// moves the entry to the most-recently-used end.
    pub(crate) fn get(&mut self, key: &K) -> Option<V> {
        let expired = self.entries.peek(key)?.is_expired(self.ttl);
        if expired {
            self.entries.pop(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Inserts a value into the cache.
    /// Returns the evicted entry if the cache was full.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries
            .push(key, CacheEntry::new(value))
            .map(|(_, entry)| entry.value)
    }

    /// Returns the current number of entries in the cache.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Clears all entries from the cache.
    #[allow(dead_code)]
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
