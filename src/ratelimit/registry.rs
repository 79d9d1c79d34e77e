//! Concurrent registry of per-key counters.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::counter::EventCounter;

/// Maps each key to the unique counter tracking it.
///
/// Lookups of existing counters are the hot path and take no exclusive
/// lock. Creation goes through the map's entry API, which locks only the
/// shard owning the key, so a never-before-seen key yields exactly one
/// counter no matter how many callers race on first access.
pub struct CounterRegistry {
    counters: DashMap<i64, Arc<EventCounter>>,
    max_rate: u32,
}

impl CounterRegistry {
    /// Create a registry whose counters all share `max_rate`.
    pub fn new(max_rate: u32) -> Self {
        Self {
            counters: DashMap::new(),
            max_rate,
        }
    }

    /// The counter for `key`, created on first use.
    pub fn counter(&self, key: i64) -> Arc<EventCounter> {
        if let Some(counter) = self.counters.get(&key) {
            return Arc::clone(&counter);
        }

        Arc::clone(
            self.counters
                .entry(key)
                .or_insert_with(|| {
                    debug!(key, max_rate = self.max_rate, "creating counter");
                    Arc::new(EventCounter::new(self.max_rate))
                })
                .value(),
        )
    }

    /// The per-window limit applied to every counter.
    pub fn max_rate(&self) -> u32 {
        self.max_rate
    }

    /// Number of keys with a live counter.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether any counter exists yet.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Drop all counters.
    ///
    /// Primarily useful for testing.
    pub fn clear(&self) {
        self.counters.clear();
    }
}
