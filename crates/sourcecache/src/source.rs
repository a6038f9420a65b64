// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache-policy orchestrator.

use std::{fmt::Debug, hash::Hash, num::NonZeroUsize, panic::AssertUnwindSafe, sync::Arc};

use futures::{
    FutureExt, StreamExt,
    future::{self, BoxFuture},
    stream::{self, BoxStream},
};
use sourcecache_flight::{Deduplicator, ProducerPanicked};
use sourcecache_memory::BoundedCache;
use sourcecache_tier::{CacheEntry, CacheKey, CacheStore};
use tokio::sync::broadcast;

use crate::{
    CacheRequirement, CachedSourceBuilder, CachedSourceResult, Error, FromCache, TimeProvider,
    time::system_clock,
};

/// Messages buffered per subscriber of the `updates` and `errors` channels: 64.
pub(crate) const DEFAULT_BROADCAST_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(63);

pub(crate) type SourceFn<P, T, E> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

pub(crate) fn boxed_source<P, T, E, F, Fut>(source: F) -> SourceFn<P, T, E>
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Arc::new(move |params| source(params).boxed())
}

/// Caches and de-duplicates calls to an asynchronous source.
///
/// A `CachedSource` wraps a function `P -> Result<T, E>` and answers requests for a parameter
/// according to a [`FromCache`] mode and a [`CacheRequirement`]:
///
/// - Successful source results are written to the store, stamped with the current time, and
///   published on [`updates`](Self::updates).
/// - Failures are published on [`errors`](Self::errors) and returned unchanged inside
///   [`Error::Source`]. A panicking source is published and returned as [`Error::Panicked`].
/// - Concurrent calls for the same key share one source execution unless the requirement
///   opts out.
///
/// Cache entries are addressed by [`CacheKey`]: the parameter plus an optional discriminator
/// of type `A`. Shared executions are keyed the same way, so calls that differ only in their
/// discriminator never share a source call.
///
/// # Examples
///
/// ```
/// use futures::StreamExt;
/// use sourcecache::{CacheRequirement, CachedSource, FromCache};
///
/// # futures::executor::block_on(async {
/// let source = CachedSource::new(|id: u32| async move { Ok::<_, String>(format!("user-{id}")) });
///
/// let loaded: Vec<_> = source.get(7, FromCache::Never, CacheRequirement::new()).collect().await;
/// assert_eq!(loaded, vec![Ok("user-7".to_string())]);
///
/// let cached = source.get_raw(7, FromCache::Only, CacheRequirement::new()).next().await;
/// assert!(cached.is_some_and(|result| result.is_ok_and(|result| result.from_cache())));
/// # });
/// ```
pub struct CachedSource<P, T, E, A = (), S = BoundedCache<CacheKey<P, A>, T>> {
    pub(crate) source: SourceFn<P, T, E>,
    pub(crate) store: Arc<S>,
    pub(crate) flights: Deduplicator<CacheKey<P, A>, Result<CachedSourceResult<T>, Error<E>>>,
    pub(crate) time: Arc<dyn TimeProvider>,
    pub(crate) updates: broadcast::Sender<(P, CachedSourceResult<T>)>,
    pub(crate) errors: broadcast::Sender<(P, Error<E>)>,
}

impl<P, T, E, A, S> Debug for CachedSource<P, T, E, A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedSource")
            .field("store", &std::any::type_name::<S>())
            .field("flights", &self.flights)
            .finish_non_exhaustive()
    }
}

impl<P, T, E> CachedSource<P, T, E> {
    /// Creates a cached source with default settings: a single-entry [`BoundedCache`], a
    /// system [`tick::Clock`] and no discriminator.
    pub fn new<F, Fut>(source: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        P: Clone,
        T: Clone,
        E: Clone,
    {
        Self::assemble(
            boxed_source(source),
            BoundedCache::default(),
            Arc::new(system_clock()),
            DEFAULT_BROADCAST_CAPACITY,
        )
    }

    /// Starts configuring a cached source around `source`.
    pub fn builder<F, Fut>(source: F) -> CachedSourceBuilder<P, T, E>
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        CachedSourceBuilder::new(boxed_source(source))
    }
}

impl<P, T, E, A, S> CachedSource<P, T, E, A, S> {
    pub(crate) fn assemble(
        source: SourceFn<P, T, E>,
        store: S,
        time: Arc<dyn TimeProvider>,
        broadcast_capacity: NonZeroUsize,
    ) -> Self
    where
        P: Clone,
        T: Clone,
        E: Clone,
    {
        let (updates, _) = broadcast::channel(broadcast_capacity.get());
        let (errors, _) = broadcast::channel(broadcast_capacity.get());

        Self {
            source,
            store: Arc::new(store),
            flights: Deduplicator::new(),
            time,
            updates,
            errors,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the number of source calls currently registered for sharing.
    ///
    /// Zero once every shared call has settled or been dropped.
    #[must_use]
    pub fn ongoing_request_count(&self) -> usize {
        self.flights.ongoing_count()
    }
}

impl<P, T, E, A, S> CachedSource<P, T, E, A, S>
where
    P: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    A: Clone + Eq + Hash + Send + Sync + 'static,
    S: CacheStore<CacheKey<P, A>, T> + 'static,
{
    /// Requests the value for `params`, without a discriminator.
    ///
    /// See [`get_raw_keyed`](Self::get_raw_keyed) for how each mode behaves.
    pub fn get(
        &self,
        params: P,
        from_cache: FromCache,
        requirement: CacheRequirement,
    ) -> BoxStream<'_, Result<T, Error<E>>> {
        self.get_keyed(CacheKey::new(params), from_cache, requirement)
    }

    /// Requests the value for `key`.
    pub fn get_keyed(
        &self,
        key: CacheKey<P, A>,
        from_cache: FromCache,
        requirement: CacheRequirement,
    ) -> BoxStream<'_, Result<T, Error<E>>> {
        self.get_raw_keyed(key, from_cache, requirement)
            .map(|item| item.map(CachedSourceResult::into_value))
            .boxed()
    }

    /// Requests the result envelope for `params`, without a discriminator.
    pub fn get_raw(
        &self,
        params: P,
        from_cache: FromCache,
        requirement: CacheRequirement,
    ) -> BoxStream<'_, Result<CachedSourceResult<T>, Error<E>>> {
        self.get_raw_keyed(CacheKey::new(params), from_cache, requirement)
    }

    /// Requests the result envelope for `key`.
    ///
    /// The returned stream does nothing until polled, and yields one item in every mode except
    /// [`FromCache::CachedThenLoad`] with a usable cache entry, which yields the cached item
    /// and then the source outcome.
    ///
    /// Cache entries are usable when they satisfy `requirement`'s maximum age.
    pub fn get_raw_keyed(
        &self,
        key: CacheKey<P, A>,
        from_cache: FromCache,
        requirement: CacheRequirement,
    ) -> BoxStream<'_, Result<CachedSourceResult<T>, Error<E>>> {
        match from_cache {
            FromCache::Never => stream::once(self.load(key, requirement)).boxed(),
            FromCache::Only => stream::once(async move {
                self.lookup(&key, requirement).await.ok_or_else(|| {
                    tracing::debug!("no usable cache entry, not calling source");
                    Error::NotCached
                })
            })
            .boxed(),
            FromCache::IfHave => stream::once(async move {
                match self.lookup(&key, requirement).await {
                    Some(cached) => Ok(cached),
                    None => self.load(key, requirement).await,
                }
            })
            .boxed(),
            FromCache::IfFailed => stream::once(async move {
                match self.load(key.clone(), requirement).await {
                    Ok(loaded) => Ok(loaded),
                    Err(error) => match self.lookup(&key, requirement).await {
                        Some(cached) => {
                            tracing::debug!("source failed, serving cached value instead");
                            Ok(cached)
                        }
                        None => Err(error),
                    },
                }
            })
            .boxed(),
            FromCache::CachedThenLoad => {
                let lookup_key = key.clone();
                let cached = stream::once(async move { self.lookup(&lookup_key, requirement).await })
                    .filter_map(|cached| future::ready(cached.map(Ok)));

                cached.chain(stream::once(self.load(key, requirement))).boxed()
            }
        }
    }

    /// Requests the value for `params` and returns the final item of the stream.
    ///
    /// For every mode except [`FromCache::CachedThenLoad`] this is the only item; for that mode
    /// it is the source outcome.
    ///
    /// # Errors
    ///
    /// Returns the error the final item carries.
    pub async fn fetch(&self, params: P, from_cache: FromCache, requirement: CacheRequirement) -> Result<T, Error<E>> {
        self.get(params, from_cache, requirement)
            .fold(None, |_, item| future::ready(Some(item)))
            .await
            .unwrap_or(Err(Error::NotCached))
    }

    /// Empties the store. Source calls in flight are unaffected and still write their results.
    pub async fn clear_cache(&self) {
        self.store.clear().await;
        tracing::debug!("cache cleared");
    }

    pub(crate) async fn lookup(&self, key: &CacheKey<P, A>, requirement: CacheRequirement) -> Option<CachedSourceResult<T>> {
        let Some(entry) = self.store.get(key).await else {
            tracing::debug!("cache miss");
            return None;
        };

        if entry.is_fresh(requirement.max_age(), self.time.now_millis()) {
            tracing::debug!(inserted_at = entry.inserted_at(), "cache hit");
            Some(CachedSourceResult::cached(entry))
        } else {
            tracing::debug!(inserted_at = entry.inserted_at(), max_age = ?requirement.max_age(), "cached entry too old");
            None
        }
    }

    pub(crate) async fn load(&self, key: CacheKey<P, A>, requirement: CacheRequirement) -> Result<CachedSourceResult<T>, Error<E>> {
        let work = self.work(key.clone());

        let outcome = if requirement.share_ongoing_request() {
            self.flights.run_shared(key, work).await
        } else {
            self.flights.run_exclusive(work).await
        };

        outcome?
    }

    /// One source execution: call, write back, publish.
    ///
    /// Runs once per execution however many callers share it, so each execution writes the
    /// cache once and publishes once. A panic in the source is published like any failure.
    fn work(
        &self,
        key: CacheKey<P, A>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<CachedSourceResult<T>, Error<E>>> + Send + use<P, T, E, A, S> {
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let time = Arc::clone(&self.time);
        let updates = self.updates.clone();
        let errors = self.errors.clone();

        move || {
            async move {
                let params = key.params().clone();

                let called = AssertUnwindSafe(source(params.clone()))
                    .catch_unwind()
                    .await
                    .map_err(|payload| Error::Panicked(ProducerPanicked::from_payload(&*payload)))
                    .and_then(|result| result.map_err(Error::Source));

                match called {
                    Ok(value) => {
                        let now = time.now_millis();
                        store.put(key, CacheEntry::with_timestamp(value.clone(), now)).await;
                        tracing::debug!(inserted_at = now, "source call succeeded, cache updated");

                        let result = CachedSourceResult::loaded(value, now);
                        if updates.send((params, result.clone())).is_err() {
                            tracing::trace!("no update subscribers");
                        }
                        Ok(result)
                    }
                    Err(error) => {
                        tracing::debug!(panicked = matches!(error, Error::Panicked(_)), "source call failed");
                        if errors.send((params, error.clone())).is_err() {
                            tracing::trace!("no error subscribers");
                        }
                        Err(error)
                    }
                }
            }
            .boxed()
        }
    }
}
