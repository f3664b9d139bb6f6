//! Capacity-bounded in-memory response store.
//!
//! # Responsibilities
//! - Hold response bodies keyed by cache key
//! - Account total stored bytes against a fixed capacity
//! - Evict in insertion order (FIFO) to make room
//! - Expire entries lazily on access
//!
//! # Design Decisions
//! - FIFO, not LRU: `get` refreshes `timestamp` but never reorders
//! - `set` on an existing key replaces it (delete + insert), so its size
//!   is never double-counted and it moves to the back of the queue
//! - Oversized items are rejected before anything is evicted
//! - One mutex guards the map and the size counter together

use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use indexmap::IndexMap;

use crate::observability::metrics;

/// A cached response as handed back to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Debug)]
struct CacheEntry {
    data: Bytes,
    content_type: String,
    size: u64,
    /// Last touched; diagnostic only, does not affect eviction.
    timestamp: Instant,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Iteration order is insertion order; index 0 is evicted first.
    entries: IndexMap<String, CacheEntry>,
    current_size: u64,
}

impl Inner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.shift_remove(key)?;
        self.current_size -= entry.size;
        Some(entry)
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (key, entry) = self.entries.shift_remove_index(0)?;
        self.current_size -= entry.size;
        Some(key)
    }
}

/// Thread-safe response cache with a fixed byte budget.
#[derive(Debug)]
pub struct ResponseCache {
    capacity: u64,
    inner: Mutex<Inner>,
}

impl ResponseCache {
    /// Create an empty cache that holds at most `capacity` bytes.
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Look up `key`, dropping it if it has expired.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("response cache mutex poisoned");

        let expired = inner.entries.get(key)?.is_expired(now);
        if expired {
            inner.remove(key);
            metrics::record_cache_event("expire");
            metrics::record_cache_size(inner.current_size);
            return None;
        }

        let entry = inner.entries.get_mut(key)?;
        entry.timestamp = now;
        Some(CachedResponse {
            data: entry.data.clone(),
            content_type: entry.content_type.clone(),
        })
    }

    /// Store `data` under `key`.
    ///
    /// Returns `false`, leaving the cache untouched, when the item alone is
    /// larger than the whole capacity. Otherwise evicts the oldest entries
    /// until the item fits.
    pub fn set(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        ttl: Option<Duration>,
    ) -> bool {
        let size = data.len() as u64;
        if size > self.capacity {
            metrics::record_cache_event("reject");
            return false;
        }

        let now = Instant::now();
        let mut inner = self.inner.lock().expect("response cache mutex poisoned");

        inner.remove(key);
        while inner.current_size + size > self.capacity {
            match inner.evict_oldest() {
                Some(evicted) => {
                    tracing::debug!(key = %evicted, "Evicted cache entry");
                    metrics::record_cache_event("evict");
                }
                None => break,
            }
        }

        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                content_type: content_type.to_string(),
                size,
                timestamp: now,
                // A TTL past the clock's range never expires.
                expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            },
        );
        inner.current_size += size;
        debug_assert!(inner.current_size <= self.capacity, "cache exceeded capacity");

        metrics::record_cache_event("store");
        metrics::record_cache_size(inner.current_size);
        true
    }

    /// Remove `key`. No-op when absent.
    pub fn delete(&self, key: &str) {
        let mut inner = self.inner.lock().expect("response cache mutex poisoned");
        if inner.remove(key).is_some() {
            metrics::record_cache_size(inner.current_size);
        }
    }

    /// Whether `key` is present and unexpired. Expired entries are dropped.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("response cache mutex poisoned");
        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };
        if expired {
            inner.remove(key);
            metrics::record_cache_size(inner.current_size);
        }
        !expired
    }

    /// Bytes currently held.
    pub fn current_size(&self) -> u64 {
        self.inner.lock().expect("response cache mutex poisoned").current_size
    }

    /// Number of entries currently held (expired ones included until touched).
    pub fn len(&self) -> usize {
        self.inner.lock().expect("response cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total byte budget.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Drop everything.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("response cache mutex poisoned");
        inner.entries.clear();
        inner.current_size = 0;
        metrics::record_cache_size(0);
    }

    /// Recompute the size counter from the entries. Test-only consistency check.
    #[cfg(test)]
    fn accounted_size(&self) -> u64 {
        let inner = self.inner.lock().unwrap();
        inner.entries.values().map(|e| e.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(n: usize) -> Bytes {
        Bytes::from(vec![7u8; n])
    }

    #[test]
    fn test_get_returns_stored_response() {
        let cache = ResponseCache::new(100);
        assert!(cache.get("/a.png").is_none());

        assert!(cache.set("/a.png", Bytes::from_static(b"png!"), "image/png", None));
        let hit = cache.get("/a.png").unwrap();
        assert_eq!(hit.data, Bytes::from_static(b"png!"));
        assert_eq!(hit.content_type, "image/png");
        assert_eq!(cache.current_size(), 4);
        assert!(cache.has("/a.png"));
    }

    #[test]
    fn test_oversized_item_is_rejected_without_mutation() {
        let cache = ResponseCache::new(10);
        assert!(cache.set("k1", bytes(6), "a", None));

        assert!(!cache.set("big", bytes(11), "a", None));
        assert!(cache.has("k1"));
        assert!(!cache.has("big"));
        assert_eq!(cache.current_size(), 6);
    }

    #[test]
    fn test_eviction_is_insertion_order() {
        let cache = ResponseCache::new(30);
        cache.set("k1", bytes(10), "a", None);
        cache.set("k2", bytes(10), "a", None);
        cache.set("k3", bytes(10), "a", None);

        // Touching k1 must not protect it
        assert!(cache.get("k1").is_some());

        assert!(cache.set("k4", bytes(10), "a", None));
        assert!(!cache.has("k1"));
        assert!(cache.has("k2"));
        assert!(cache.has("k3"));
        assert!(cache.has("k4"));
        assert_eq!(cache.current_size(), 30);
    }

    #[test]
    fn test_eviction_removes_as_many_as_needed() {
        let cache = ResponseCache::new(30);
        cache.set("k1", bytes(10), "a", None);
        cache.set("k2", bytes(10), "a", None);
        cache.set("k3", bytes(10), "a", None);

        assert!(cache.set("k4", bytes(25), "a", None));
        assert_eq!(cache.len(), 1);
        assert!(cache.has("k4"));
        assert_eq!(cache.current_size(), 25);
    }

    #[test]
    fn test_zero_ttl_expires_on_next_get() {
        let cache = ResponseCache::new(100);
        cache.set("k", bytes(10), "a", Some(Duration::ZERO));
        assert_eq!(cache.current_size(), 10);

        assert!(cache.get("k").is_none());
        assert_eq!(cache.current_size(), 0);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_entry_lives_until_ttl() {
        let cache = ResponseCache::new(100);
        cache.set("k", bytes(10), "a", Some(Duration::from_millis(50)));
        assert!(cache.get("k").is_some());

        std::thread::sleep(Duration::from_millis(80));
        assert!(!cache.has("k"));
        assert_eq!(cache.current_size(), 0);
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let cache = ResponseCache::new(100);
        assert!(cache.set("k", bytes(10), "a", Some(Duration::from_secs(u64::MAX))));
        assert!(cache.get("k").is_some());
        assert!(cache.has("k"));
    }

    #[test]
    fn test_overwrite_replaces_size() {
        let cache = ResponseCache::new(100);
        cache.set("k", bytes(40), "a", None);
        cache.set("k", bytes(30), "b", None);

        assert_eq!(cache.current_size(), 30);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").unwrap().content_type, "b");
    }

    #[test]
    fn test_overwrite_moves_key_to_back_of_queue() {
        let cache = ResponseCache::new(30);
        cache.set("k1", bytes(10), "a", None);
        cache.set("k2", bytes(10), "a", None);
        cache.set("k1", bytes(10), "a", None);
        cache.set("k3", bytes(10), "a", None);

        cache.set("k4", bytes(10), "a", None);
        assert!(!cache.has("k2"));
        assert!(cache.has("k1"));
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = ResponseCache::new(100);
        cache.set("k1", bytes(10), "a", None);
        cache.set("k2", bytes(20), "a", None);

        cache.delete("k1");
        cache.delete("missing");
        assert_eq!(cache.current_size(), 20);

        cache.clear();
        assert_eq!(cache.current_size(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let capacity = 1000;
        let cache = ResponseCache::new(capacity);
        // Deterministic pseudo-random sizes and keys
        let mut seed: u64 = 0x2545F4914F6CDD1D;
        for i in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let size = (seed % 1200) as usize;
            let key = format!("k{}", seed % 40);
            let before = cache.current_size();
            let stored = cache.set(&key, bytes(size), "a", None);

            if size as u64 > capacity {
                assert!(!stored, "iteration {i}");
                assert_eq!(cache.current_size(), before);
            } else {
                assert!(stored, "iteration {i}");
            }
            assert!(cache.current_size() <= capacity);
            assert_eq!(cache.current_size(), cache.accounted_size());
        }
    }
}
