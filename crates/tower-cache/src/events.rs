//! Event types for cache.

use std::time::Instant;
use tower_resilience_core::ResilienceEvent;

/// Events emitted by the cache.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A cache hit occurred.
    Hit {
        /// The name of the cache instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
    /// A cache miss occurred.
    Miss {
        /// The name of the cache instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
    /// An entry was evicted from the cache.
    Eviction {
        /// The name of the cache instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
}

impl ResilienceEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "cache_hit",
            CacheEvent::Miss { .. } => "cache_miss",
            CacheEvent::Eviction { .. } => "cache_eviction",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::Eviction { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            CacheEvent::Hit { pattern_name, .. }
            | CacheEvent::Miss { pattern_name, .. }
            | CacheEvent::Eviction { pattern_name, .. } => pattern_name,
        }
    }
}
