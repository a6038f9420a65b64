// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Sources that take no parameter.

use futures::stream::BoxStream;
use sourcecache_tier::{CacheKey, CacheStore};

use crate::{CacheRequirement, CachedSource, Error, FromCache};

impl<T, E> CachedSource<(), T, E> {
    /// Creates a cached source around a function without parameters.
    ///
    /// With the default single-entry store this caches exactly the latest result.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::StreamExt;
    /// use sourcecache::{CacheRequirement, CachedSource, FromCache};
    ///
    /// # futures::executor::block_on(async {
    /// let config = CachedSource::unkeyed(|| async { Ok::<_, String>("loaded") });
    ///
    /// let first = config.get_unkeyed(FromCache::IfHave, CacheRequirement::new()).next().await;
    /// assert_eq!(first, Some(Ok("loaded")));
    /// # });
    /// ```
    pub fn unkeyed<F, Fut>(source: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Clone,
        E: Clone,
    {
        Self::new(move |()| source())
    }
}

impl<T, E, A, S> CachedSource<(), T, E, A, S>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    A: Clone + Eq + std::hash::Hash + Send + Sync + 'static,
    S: CacheStore<CacheKey<(), A>, T> + 'static,
{
    /// Requests the value of a parameterless source.
    pub fn get_unkeyed(&self, from_cache: FromCache, requirement: CacheRequirement) -> BoxStream<'_, Result<T, Error<E>>> {
        self.get((), from_cache, requirement)
    }
}
