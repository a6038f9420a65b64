// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A capacity-bounded, insertion-ordered in-memory store.
//!
//! This crate provides [`BoundedCache`], the default [`CacheStore`](sourcecache_tier::CacheStore)
//! behind `sourcecache`. It holds at most a fixed number of entries and, when a new key pushes
//! it over capacity, evicts the key that was inserted first. Reads never change eviction order.
//!
//! # Quick Start
//!
//! ```
//! use sourcecache_memory::BoundedCache;
//! use sourcecache_tier::{CacheEntry, CacheStore};
//!
//! # futures::executor::block_on(async {
//! let cache = BoundedCache::new(2)?;
//!
//! cache.put("a", CacheEntry::new(1)).await;
//! cache.put("b", CacheEntry::new(2)).await;
//! cache.put("c", CacheEntry::new(3)).await;
//!
//! assert!(cache.get(&"a").await.is_none());
//! assert_eq!(cache.get(&"c").await.map(CacheEntry::into_value), Some(3));
//! # Ok::<(), sourcecache_tier::ConfigError>(())
//! # });
//! ```

mod bounded;

#[doc(inline)]
pub use bounded::BoundedCache;
