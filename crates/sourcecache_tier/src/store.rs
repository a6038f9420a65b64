// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache storage backends.
//!
//! [`CacheStore`] defines the narrow interface the source orchestrator consumes:
//! lookup, insert-or-overwrite and clear. Freshness, sharing and source calls are
//! layered on top by `sourcecache`.

use crate::CacheEntry;

/// Trait for cache store implementations.
///
/// All three core methods are required. Implementations must serialize them against each
/// other: a `put` that evicts must never be observed half-done by a concurrent `get` or
/// `clear`. None of the operations can fail.
///
/// Only `len` and `is_empty` have default implementations:
/// - `len`: Returns `None` (not all stores track size)
/// - `is_empty`: Delegates to `len`
pub trait CacheStore<K, V>: Send + Sync {
    /// Looks up the entry stored under `key` without any side effect.
    fn get(&self, key: &K) -> impl Future<Output = Option<CacheEntry<V>>> + Send;

    /// Inserts `entry` under `key`, overwriting any previous entry for the same key.
    fn put(&self, key: K, entry: CacheEntry<V>) -> impl Future<Output = ()> + Send;

    /// Removes every entry.
    fn clear(&self) -> impl Future<Output = ()> + Send;

    /// Returns the number of entries, if supported.
    ///
    /// Returns `None` for implementations that don't track size.
    fn len(&self) -> Option<usize> {
        None
    }

    /// Returns `true` if the store contains no entries.
    ///
    /// Returns `None` for implementations that don't track size.
    fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }
}
