// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Storage abstractions for caching the results of asynchronous sources.
//!
//! This crate defines the [`CacheStore`] trait that cache backends implement, along with
//! [`CacheKey`] for addressing entries, [`CacheEntry`] for storing values with their insertion
//! time, and [`ConfigError`] for rejecting invalid construction parameters.
//!
//! # Overview
//!
//! A store is a plain key-value container. It knows nothing about sources, sharing or
//! freshness policies; `sourcecache` layers those on top. Keep implementations simple:
//! every operation is expected to succeed and to be serialized against the others.
//!
//! # Implementing a Store
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//!
//! use sourcecache_tier::{CacheEntry, CacheStore};
//!
//! struct Unbounded<K, V>(Mutex<HashMap<K, CacheEntry<V>>>);
//!
//! impl<K, V> CacheStore<K, V> for Unbounded<K, V>
//! where
//!     K: Eq + std::hash::Hash + Send + Sync,
//!     V: Clone + Send + Sync,
//! {
//!     async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
//!         self.0.lock().ok()?.get(key).cloned()
//!     }
//!
//!     async fn put(&self, key: K, entry: CacheEntry<V>) {
//!         if let Ok(mut map) = self.0.lock() {
//!             map.insert(key, entry);
//!         }
//!     }
//!
//!     async fn clear(&self) {
//!         if let Ok(mut map) = self.0.lock() {
//!             map.clear();
//!         }
//!     }
//! }
//! ```

mod entry;
pub mod error;
mod key;
mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use entry::CacheEntry;
#[doc(inline)]
pub use error::ConfigError;
#[doc(inline)]
pub use key::CacheKey;
#[doc(inline)]
pub use store::CacheStore;
