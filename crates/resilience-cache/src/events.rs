//! Events emitted by the cache service.

use resilience_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by the cache service.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A lookup found a live entry for the key.
    Hit {
        /// Name of the cache instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// A lookup found no live entry; the wrapped service is about to be called.
    Miss {
        /// Name of the cache instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// A concurrent miss for the same key joined an in-flight computation
    /// instead of calling the wrapped service itself.
    Coalesced {
        /// Name of the cache instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// Inserting a new entry evicted the least-recently-used entry.
    Eviction {
        /// Name of the cache instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
}

impl ResilienceEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Hit { .. } => "hit",
            Self::Miss { .. } => "miss",
            Self::Coalesced { .. } => "coalesced",
            Self::Eviction { .. } => "eviction",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Hit { timestamp, .. }
            | Self::Miss { timestamp, .. }
            | Self::Coalesced { timestamp, .. }
            | Self::Eviction { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::Hit { pattern_name, .. }
            | Self::Miss { pattern_name, .. }
            | Self::Coalesced { pattern_name, .. }
            | Self::Eviction { pattern_name, .. } => pattern_name,
        }
    }
}
