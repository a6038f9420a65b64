// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use sourcecache_tier::CacheEntry;

/// A value delivered by a cached source, with where and when it came from.
///
/// `origin_timestamp` is when the value was produced by the source (as written to the
/// cache), not when this particular copy was delivered. It is `None` only for cache entries
/// that were stored without a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachedSourceResult<T> {
    value: T,
    from_cache: bool,
    origin_timestamp: Option<i64>,
}

impl<T> CachedSourceResult<T> {
    /// Creates a result envelope.
    pub fn new(value: T, from_cache: bool, origin_timestamp: Option<i64>) -> Self {
        Self {
            value,
            from_cache,
            origin_timestamp,
        }
    }

    pub(crate) fn loaded(value: T, now_millis: i64) -> Self {
        Self::new(value, false, Some(now_millis))
    }

    pub(crate) fn cached(entry: CacheEntry<T>) -> Self {
        let origin_timestamp = entry.inserted_at();
        Self::new(entry.into_value(), true, origin_timestamp)
    }

    /// The delivered value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consumes the result, returning the value.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Whether the value was served from the cache rather than a source call.
    #[must_use]
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Milliseconds since the UNIX epoch at which the value was produced.
    #[must_use]
    pub fn origin_timestamp(&self) -> Option<i64> {
        self.origin_timestamp
    }
}
