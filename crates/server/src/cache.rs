//! TTL cache with stale-serving fallback.
//!
//! Backs read-through access to catalog and entitlement data: callers try a
//! fresh fetch first and, when the upstream read fails, fall back to the last
//! cached value even if it has expired. Expired entries are therefore kept
//! until overwritten or cleared rather than evicted; `get` simply refuses to
//! return them. There is no background eviction task.
//!
//! Cached entitlement data is identity-scoped, so [`RevalidateCache::clear`]
//! must be called whenever the current identity changes.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// A keyed TTL cache whose expired entries remain readable via
/// [`get_stale`](Self::get_stale).
pub struct RevalidateCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> RevalidateCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a value that stays fresh for `ttl` from now.
    ///
    /// Overwriting also discards any stale value previously held under the
    /// same key.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.lock().insert(key, entry);
    }

    /// Get a fresh value. Expired entries are treated as absent.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Get a value regardless of freshness.
    ///
    /// This is the fallback path for failed upstream fetches; a stale answer
    /// beats failing the whole request.
    pub fn get_stale(&self, key: &K) -> Option<V> {
        self.lock().get(key).map(|entry| entry.value.clone())
    }

    /// Whether the entry for `key` exists but has expired.
    pub fn is_stale(&self, key: &K) -> bool {
        self.lock()
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
    }

    /// Drop the entry for `key`, fresh or stale.
    pub fn remove(&self, key: &K) {
        self.lock().remove(key);
    }

    /// Drop all entries. Must be called on identity change so cached
    /// entitlement data cannot leak across accounts.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Default for RevalidateCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(60);

    #[test]
    fn round_trips_fresh_values() {
        let cache = RevalidateCache::new();
        cache.set("courses", 1u32, LONG);
        assert_eq!(cache.get(&"courses"), Some(1));
        assert!(!cache.is_stale(&"courses"));
    }

    #[test]
    fn missing_keys_are_absent_and_not_stale() {
        let cache: RevalidateCache<&str, u32> = RevalidateCache::new();
        assert_eq!(cache.get(&"nope"), None);
        assert_eq!(cache.get_stale(&"nope"), None);
        assert!(!cache.is_stale(&"nope"));
    }

    #[test]
    fn expired_entries_are_absent_but_stale_readable() {
        let cache = RevalidateCache::new();
        cache.set("courses", 7u32, Duration::ZERO);
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(cache.get(&"courses"), None);
        assert!(cache.is_stale(&"courses"));
        assert_eq!(cache.get_stale(&"courses"), Some(7));
    }

    #[test]
    fn overwrite_refreshes_a_stale_entry() {
        let cache = RevalidateCache::new();
        cache.set("courses", 7u32, Duration::ZERO);
        std::thread::sleep(Duration::from_millis(5));
        cache.set("courses", 8u32, LONG);

        assert_eq!(cache.get(&"courses"), Some(8));
        assert!(!cache.is_stale(&"courses"));
    }

    #[test]
    fn clear_drops_stale_values_too() {
        let cache = RevalidateCache::new();
        cache.set("a", 1u32, Duration::ZERO);
        cache.set("b", 2u32, LONG);
        std::thread::sleep(Duration::from_millis(5));

        cache.clear();
        assert_eq!(cache.get_stale(&"a"), None);
        assert_eq!(cache.get_stale(&"b"), None);
    }

    #[test]
    fn remove_drops_a_single_entry() {
        let cache = RevalidateCache::new();
        cache.set("a", 1u32, LONG);
        cache.set("b", 2u32, LONG);

        cache.remove(&"a");
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
    }
}
