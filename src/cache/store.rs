//! Cache Store Module
//!
//! Generic key-value store with per-entry TTL, lazy expiration and prefix eviction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};
use crate::clock::{duration_ms, Clock, SystemClock};

// == Cache Store ==
/// TTL cache polymorphic over the stored value type.
///
/// Operations never fail: absence and expiry are reported through return values.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Time source for expiration checks
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store reading the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store reading the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            clock,
        }
    }

    // == Set ==
    /// Stores `value` under `key` until `now + ttl`.
    ///
    /// An existing entry for `key` is replaced and its TTL reset.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        let now = self.clock.now_ms();
        let entry = CacheEntry::new(value, now, duration_ms(ttl));
        self.entries.insert(key.into(), entry);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the value for `key` if present and not expired.
    ///
    /// An expired entry found here is removed and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_expired(1);
                self.stats.record_miss();
                self.stats.set_total_entries(self.entries.len());
                debug!(key, "Dropped expired cache entry on read");
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes `key` if present. Returns whether an entry was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_invalidated(1);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Delete By Prefix ==
    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Scans the full key set. Returns the number of entries removed.
    pub fn delete_by_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - self.entries.len();

        self.stats.record_invalidated(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Removes all entries. Returns the number of entries removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.record_invalidated(removed);
        self.stats.set_total_entries(0);
        removed
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();

        self.stats.record_expired(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    /// Returns true if `key` holds a live entry. Does not touch stats.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| Duration::from_millis(entry.ttl_remaining_ms(now)))
    }

    /// Keys of all live entries, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
