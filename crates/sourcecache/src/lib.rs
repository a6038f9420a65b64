// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Caching and request de-duplication in front of an asynchronous source.
//!
//! This crate provides [`CachedSource`], which wraps an asynchronous function `P -> Result<T, E>`
//! (a network call, a disk read, anything slow) and:
//!
//! - Runs one source call for many concurrent identical requests, delivering its outcome to
//!   every caller
//! - Keeps recent results in a bounded in-memory store and serves them according to a
//!   per-call [`FromCache`] mode and [`CacheRequirement`]
//! - Publishes every source result and failure on broadcast [`updates`](CachedSource::updates)
//!   and [`errors`](CachedSource::errors) streams
//!
//! # Modes
//!
//! | Mode                          | Cache read          | Source call                 | Items |
//! |-------------------------------|---------------------|-----------------------------|-------|
//! | [`FromCache::Never`]          | no                  | always                      | 1     |
//! | [`FromCache::IfHave`]         | first               | on miss                     | 1     |
//! | [`FromCache::IfFailed`]       | if the source fails | always                      | 1     |
//! | [`FromCache::CachedThenLoad`] | first               | always                      | 1-2   |
//! | [`FromCache::Only`]           | only                | never                       | 1     |
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use futures::StreamExt;
//! use sourcecache::{CacheRequirement, CachedSource, FromCache};
//!
//! # futures::executor::block_on(async {
//! let prices = CachedSource::builder(|ticker: &'static str| async move {
//!     // Call a slow service here.
//!     Ok::<_, String>(ticker.len() as u64 * 100)
//! })
//! .capacity(64)
//! .build()?;
//!
//! // Load and populate the cache.
//! let price = prices.fetch("MSFT", FromCache::Never, CacheRequirement::new()).await;
//! assert_eq!(price, Ok(400));
//!
//! // Served from the cache while it is younger than a minute.
//! let fresh = CacheRequirement::new().with_max_age(Duration::from_secs(60));
//! let cached: Vec<_> = prices.get_raw("MSFT", FromCache::IfHave, fresh).collect().await;
//! assert!(cached[0].as_ref().is_ok_and(|result| result.from_cache()));
//! # Ok::<(), sourcecache::ConfigError>(())
//! # });
//! ```
//!
//! # Errors
//!
//! Calls fail with [`Error`]: the source's own error, a cache miss in [`FromCache::Only`]
//! mode, or a panic inside the source. Invalid settings fail when the source is
//! [built](CachedSourceBuilder::build), never at call time.
//!
//! # Logging
//!
//! Cache decisions are emitted as `tracing` events at DEBUG level and registry bookkeeping at
//! TRACE level.

mod builder;
mod error;
mod ext;
mod mode;
mod observe;
mod result;
mod source;
mod time;
mod unkeyed;

pub use builder::CachedSourceBuilder;
pub use error::Error;
pub use mode::{CacheRequirement, FromCache};
pub use result::CachedSourceResult;
pub use source::CachedSource;
#[doc(inline)]
pub use sourcecache_flight::ProducerPanicked;
#[doc(inline)]
pub use sourcecache_memory::BoundedCache;
#[doc(inline)]
pub use sourcecache_tier::{CacheEntry, CacheKey, CacheStore, ConfigError};
pub use time::TimeProvider;
