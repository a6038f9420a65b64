// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory store with first-in eviction.

use std::{
    collections::{HashMap, VecDeque},
    fmt::Debug,
    hash::Hash,
    num::NonZeroUsize,
};

use ahash::RandomState;
use parking_lot::Mutex;
use sourcecache_tier::{CacheEntry, CacheStore, ConfigError};

/// Capacity used by [`BoundedCache::default`].
const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::MIN;

/// A capacity-bounded store that evicts the oldest inserted key first.
///
/// Overwriting an existing key replaces its entry but keeps the key's original position in
/// the eviction order; reads never promote. All operations share one lock, so a write that
/// evicts is never observed half-done.
///
/// # Examples
///
/// ```
/// use sourcecache_memory::BoundedCache;
/// use sourcecache_tier::{CacheEntry, CacheStore};
///
/// # futures::executor::block_on(async {
/// let cache = BoundedCache::new(2)?;
/// cache.put("a", CacheEntry::new(1)).await;
/// cache.put("b", CacheEntry::new(2)).await;
///
/// // Overwriting "a" does not make it the newest key.
/// cache.put("a", CacheEntry::new(10)).await;
/// cache.put("c", CacheEntry::new(3)).await;
///
/// assert!(cache.get(&"a").await.is_none());
/// assert_eq!(cache.keys(), vec!["b", "c"]);
/// # Ok::<(), sourcecache_tier::ConfigError>(())
/// # });
/// ```
pub struct BoundedCache<K, V> {
    capacity: NonZeroUsize,
    inner: Mutex<Slots<K, V>>,
}

struct Slots<K, V> {
    entries: HashMap<K, CacheEntry<V>, RandomState>,
    // Keys from oldest to newest insertion.
    order: VecDeque<K>,
}

impl<K, V> Slots<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            order: VecDeque::with_capacity(capacity),
        }
    }
}

impl<K, V> BoundedCache<K, V> {
    /// Creates a store holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use sourcecache_memory::BoundedCache;
    ///
    /// assert!(BoundedCache::<String, i32>::new(0).is_err());
    /// assert!(BoundedCache::<String, i32>::new(16).is_ok());
    /// ```
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(capacity)
            .map(Self::with_capacity)
            .ok_or(ConfigError::ZeroCapacity { what: "cache" })
    }

    /// Creates a store holding at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Slots::with_capacity(capacity.get())),
        }
    }

    /// Returns the maximum number of entries this store keeps.
    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Returns the stored keys from oldest to newest insertion.
    #[must_use]
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.inner.lock().order.iter().cloned().collect()
    }
}

impl<K, V> Default for BoundedCache<K, V> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<K, V> Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("capacity", &self.capacity)
            .field("len", &self.inner.lock().order.len())
            .finish()
    }
}

impl<K, V> CacheStore<K, V> for BoundedCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        self.inner.lock().entries.get(key).cloned()
    }

    async fn put(&self, key: K, entry: CacheEntry<V>) {
        let mut slots = self.inner.lock();

        if let Some(existing) = slots.entries.get_mut(&key) {
            *existing = entry;
            return;
        }

        slots.order.push_back(key.clone());
        slots.entries.insert(key, entry);

        while slots.order.len() > self.capacity.get() {
            let Some(oldest) = slots.order.pop_front() else {
                break;
            };
            slots.entries.remove(&oldest);
            tracing::trace!(capacity = self.capacity.get(), "evicted oldest cache entry");
        }
    }

    async fn clear(&self) {
        let mut slots = self.inner.lock();
        slots.entries.clear();
        slots.order.clear();
    }

    fn len(&self) -> Option<usize> {
        Some(self.inner.lock().order.len())
    }
}
