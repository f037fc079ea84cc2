//! Process-wide TTL cache store.
//!
//! Uses DashMap for concurrent access with per-key sharding.
//! Expiry is lazy: an entry read after its deadline is removed and
//! reported as a miss. Entries that are never read again are never purged.

use crate::key::CanonicalKey;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

static GLOBAL: Lazy<CacheStore> = Lazy::new(CacheStore::new);

type Value = Arc<dyn Any + Send + Sync>;

/// Cache entry with an expiry deadline.
struct CacheEntry {
    value: Value,
    // None when `now + ttl` does not fit in an Instant.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Value, ttl: Duration) -> Self {
        CacheEntry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }
}

/// Keyed store mapping a [`CanonicalKey`] to a value and its expiry.
///
/// Values are type-erased so orchestrators with different data types can
/// share one store. A value is handed back as the same `Arc` that was
/// stored; nothing is copied or serialized.
///
/// `CacheStore` is cheap to clone; clones share the same entries.
///
/// # Example
///
/// ```
/// use fetch_kit::key::KeyNormalizer;
/// use fetch_kit::store::CacheStore;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let store = CacheStore::new();
/// let key = KeyNormalizer::canonicalize(&("posts", 1)).unwrap();
///
/// store.put(&key, Arc::new(vec![1, 2, 3]), Duration::from_secs(10));
/// let cached: Option<Arc<Vec<i32>>> = store.get(&key);
/// assert_eq!(cached.as_deref(), Some(&vec![1, 2, 3]));
/// ```
#[derive(Clone, Default)]
pub struct CacheStore {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl CacheStore {
    /// Create a new, isolated store.
    pub fn new() -> Self {
        CacheStore {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// The process-wide store.
    ///
    /// Created on first use and never torn down; entries expire individually.
    /// Orchestrators use it unless another store is injected.
    pub fn global() -> &'static CacheStore {
        &GLOBAL
    }

    /// Store `value` under `key`, expiring `ttl` from now.
    ///
    /// Unconditionally overwrites any existing entry for the key.
    pub fn put<T: Send + Sync + 'static>(&self, key: &CanonicalKey, value: Arc<T>, ttl: Duration) {
        let entry = CacheEntry::new(value, ttl);
        self.entries.insert(key.as_str().to_string(), entry);
        debug!("✓ Store SET {} (TTL: {:?})", key, ttl);
    }

    /// Look up `key`.
    ///
    /// Returns the stored value while `now <= expires_at`. An expired entry
    /// is deleted. An entry holding a different type is a miss and is kept.
    pub fn get<T: Send + Sync + 'static>(&self, key: &CanonicalKey) -> Option<Arc<T>> {
        let now = Instant::now();
        let live = match self.entries.get(key.as_str()) {
            Some(entry) if !entry.is_expired_at(now) => Some(Arc::clone(&entry.value)),
            Some(_) => None,
            None => {
                debug!("✓ Store GET {} -> MISS", key);
                return None;
            }
        };

        match live {
            Some(value) => match value.downcast::<T>() {
                Ok(value) => {
                    debug!("✓ Store GET {} -> HIT", key);
                    Some(value)
                }
                Err(_) => {
                    debug!("✓ Store GET {} -> MISS (type mismatch)", key);
                    None
                }
            },
            None => {
                // A concurrent put may have replaced the entry since the read.
                self.entries
                    .remove_if(key.as_str(), |_, entry| entry.is_expired_at(now));
                debug!("✓ Store GET {} -> EXPIRED", key);
                None
            }
        }
    }

    /// Check for a live entry without touching it.
    pub fn contains(&self, key: &CanonicalKey) -> bool {
        let now = Instant::now();
        self.entries
            .get(key.as_str())
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Remove the entry for `key`, if any.
    pub fn remove(&self, key: &CanonicalKey) {
        self.entries.remove(key.as_str());
        debug!("✓ Store DELETE {}", key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.clear();
        warn!("⚠ Store CLEAR executed - all entries removed!");
    }

    /// Number of entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get entry statistics.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let expired_entries = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired_at(now))
            .count();

        CacheStats {
            total_entries: self.entries.len(),
            expired_entries,
        }
    }

    /// Print store statistics to debug log.
    pub fn log_stats(&self) {
        let stats = self.stats();
        debug!(
            "Store Stats: {} entries ({} expired)",
            stats.total_entries, stats.expired_entries
        );
    }
}

/// Store statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyNormalizer;

    fn key(part: &str) -> CanonicalKey {
        KeyNormalizer::canonicalize(&[part]).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_put_get() {
        let store = CacheStore::new();
        let value = Arc::new("value1".to_string());

        store.put(&key("a"), Arc::clone(&value), Duration::from_secs(10));

        let cached: Arc<String> = store.get(&key("a")).expect("entry should be live");
        assert!(Arc::ptr_eq(&cached, &value));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_miss() {
        let store = CacheStore::new();
        assert!(store.get::<String>(&key("nonexistent")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_zero_ttl_hit_without_elapsed_time() {
        let store = CacheStore::new();
        store.put(&key("a"), Arc::new(1u32), Duration::ZERO);

        assert_eq!(store.get::<u32>(&key("a")).as_deref(), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ttl_boundary() {
        let store = CacheStore::new();
        store.put(&key("a"), Arc::new(1u32), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(store.get::<u32>(&key("a")).is_some(), "now == expires_at is live");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(store.get::<u32>(&key("a")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_expired_entry_removed_on_read() {
        let store = CacheStore::new();
        store.put(&key("a"), Arc::new(1u32), Duration::from_secs(1));
        store.put(&key("b"), Arc::new(2u32), Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.stats().expired_entries, 2);

        assert!(store.get::<u32>(&key("a")).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.stats(),
            CacheStats {
                total_entries: 1,
                expired_entries: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_overwrite() {
        let store = CacheStore::new();
        store.put(&key("a"), Arc::new(1u32), Duration::from_secs(1));
        store.put(&key("a"), Arc::new(2u32), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.get::<u32>(&key("a")).as_deref(), Some(&2));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_type_mismatch_is_miss() {
        let store = CacheStore::new();
        store.put(&key("a"), Arc::new(1u32), Duration::from_secs(10));

        assert!(store.get::<String>(&key("a")).is_none());
        assert_eq!(store.get::<u32>(&key("a")).as_deref(), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_remove_and_clear() {
        let store = CacheStore::new();
        store.put(&key("a"), Arc::new(1u32), Duration::from_secs(10));
        store.put(&key("b"), Arc::new(2u32), Duration::from_secs(10));

        store.remove(&key("a"));
        assert!(!store.contains(&key("a")));
        assert!(store.contains(&key("b")));

        store.clear();
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_log_stats_leaves_entries() {
        let store = CacheStore::new();
        store.put(&key("a"), Arc::new(1u32), Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;

        store.log_stats();

        assert_eq!(
            store.stats(),
            CacheStats {
                total_entries: 1,
                expired_entries: 1,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_clone_shares_entries() {
        let store1 = CacheStore::new();
        let store2 = store1.clone();

        store1.put(&key("a"), Arc::new(1u32), Duration::from_secs(10));
        assert!(store2.contains(&key("a")));
    }

    #[test]
    fn test_global_store_is_shared() {
        assert!(std::ptr::eq(CacheStore::global(), CacheStore::global()));
    }

    #[tokio::test]
    async fn test_store_thread_safe() {
        let store = CacheStore::new();
        let mut handles = vec![];

        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let k = KeyNormalizer::canonicalize(&("key", i)).unwrap();
                store.put(&k, Arc::new(i), Duration::from_secs(60));
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(store.len(), 10);
    }
}
