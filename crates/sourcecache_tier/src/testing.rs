// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Recording store implementation for testing.
//!
//! This module provides `MockStore`, an unbounded in-memory store that records every
//! operation so tests can assert which lookups and writes an orchestrator performed.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use parking_lot::Mutex;

use crate::{CacheEntry, CacheStore};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp<K, V> {
    /// A lookup was performed with the given key.
    Get(K),
    /// A write was performed with the given key and entry.
    Put {
        /// The key that was written.
        key: K,
        /// The entry that was written.
        entry: CacheEntry<V>,
    },
    /// The store was cleared.
    Clear,
}

/// An unbounded store that records all operations.
///
/// Clones share the same data and operation log.
///
/// # Examples
///
/// ```no_run
/// # #[cfg(feature = "test-util")]
/// # async fn example() {
/// use sourcecache_tier::{CacheEntry, CacheStore, testing::{MockStore, StoreOp}};
///
/// let store = MockStore::<String, i32>::new();
///
/// store.put("key".to_string(), CacheEntry::with_timestamp(42, 7)).await;
/// let entry = store.get(&"key".to_string()).await;
/// assert_eq!(entry.map(CacheEntry::into_value), Some(42));
///
/// assert_eq!(store.operations(), vec![
///     StoreOp::Put { key: "key".to_string(), entry: CacheEntry::with_timestamp(42, 7) },
///     StoreOp::Get("key".to_string()),
/// ]);
/// # }
/// ```
pub struct MockStore<K, V> {
    data: Arc<Mutex<HashMap<K, CacheEntry<V>>>>,
    operations: Arc<Mutex<Vec<StoreOp<K, V>>>>,
}

impl<K, V> std::fmt::Debug for MockStore<K, V>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .finish()
    }
}

impl<K, V> Clone for MockStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
        }
    }
}

impl<K, V> Default for MockStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MockStore<K, V> {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the number of entries currently stored.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }
}

impl<K, V> MockStore<K, V>
where
    K: Eq + Hash,
{
    /// Creates a store with pre-populated data. Seeding is not recorded.
    #[must_use]
    pub fn with_data(data: HashMap<K, CacheEntry<V>>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns true if the store holds an entry for the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.lock().contains_key(key)
    }
}

impl<K, V> MockStore<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp<K, V>> {
        self.operations.lock().clone()
    }

    /// Returns only the recorded writes, in order.
    #[must_use]
    pub fn puts(&self) -> Vec<(K, CacheEntry<V>)> {
        self.operations
            .lock()
            .iter()
            .filter_map(|op| match op {
                StoreOp::Put { key, entry } => Some((key.clone(), entry.clone())),
                _ => None,
            })
            .collect()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: StoreOp<K, V>) {
        self.operations.lock().push(op);
    }
}

impl<K, V> CacheStore<K, V> for MockStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        self.record(StoreOp::Get(key.clone()));
        self.data.lock().get(key).cloned()
    }

    async fn put(&self, key: K, entry: CacheEntry<V>) {
        self.record(StoreOp::Put {
            key: key.clone(),
            entry: entry.clone(),
        });
        self.data.lock().insert(key, entry);
    }

    async fn clear(&self) {
        self.record(StoreOp::Clear);
        self.data.lock().clear();
    }

    fn len(&self) -> Option<usize> {
        Some(self.data.lock().len())
    }
}
