// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring a [`CachedSource`].

use std::{fmt::Debug, marker::PhantomData, num::NonZeroUsize, sync::Arc};

use sourcecache_memory::BoundedCache;
use sourcecache_tier::{CacheKey, CacheStore, ConfigError};

use crate::{
    CachedSource, TimeProvider,
    source::{SourceFn, DEFAULT_BROADCAST_CAPACITY},
    time::system_clock,
};

/// Builder for a [`CachedSource`].
///
/// Created by [`CachedSource::builder`]. Every setting has a default, and invalid settings are
/// reported by [`build`](Self::build) rather than when the source is used.
///
/// The store defaults to a [`BoundedCache`] holding one entry. To use a custom store with a
/// discriminator type, call [`keyed_by`](Self::keyed_by) before [`store`](Self::store).
///
/// # Examples
///
/// ```
/// use sourcecache::CachedSource;
/// use tick::Clock;
///
/// let source = CachedSource::builder(|id: u32| async move { Ok::<_, String>(id * 2) })
///     .capacity(128)
///     .keyed_by::<&'static str>()
///     .time_provider(Clock::new_frozen())
///     .broadcast_capacity(16)
///     .build()?;
/// # Ok::<(), sourcecache::ConfigError>(())
/// ```
pub struct CachedSourceBuilder<P, T, E, A = (), S = BoundedCache<CacheKey<P, A>, T>> {
    source: SourceFn<P, T, E>,
    store: Result<S, ConfigError>,
    time: Arc<dyn TimeProvider>,
    broadcast_capacity: usize,
    _key: PhantomData<fn() -> A>,
}

impl<P, T, E, A, S> Debug for CachedSourceBuilder<P, T, E, A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedSourceBuilder")
            .field("store", &self.store.as_ref().map(|_| std::any::type_name::<S>()))
            .field("broadcast_capacity", &self.broadcast_capacity)
            .finish_non_exhaustive()
    }
}

impl<P, T, E> CachedSourceBuilder<P, T, E> {
    pub(crate) fn new(source: SourceFn<P, T, E>) -> Self {
        Self {
            source,
            store: Ok(BoundedCache::default()),
            time: Arc::new(system_clock()),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY.get(),
            _key: PhantomData,
        }
    }
}

impl<P, T, E, A> CachedSourceBuilder<P, T, E, A> {
    /// Sets how many entries the default store keeps. Zero is rejected by `build`.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.store = BoundedCache::new(capacity);
        self
    }

    /// Chooses the type of the extra discriminator in cache keys.
    ///
    /// The configured capacity is kept.
    #[must_use]
    pub fn keyed_by<A2>(self) -> CachedSourceBuilder<P, T, E, A2> {
        CachedSourceBuilder {
            source: self.source,
            store: self.store.map(|store| BoundedCache::with_capacity(store.capacity())),
            time: self.time,
            broadcast_capacity: self.broadcast_capacity,
            _key: PhantomData,
        }
    }
}

impl<P, T, E, A, S> CachedSourceBuilder<P, T, E, A, S> {
    /// Replaces the store with a custom one.
    #[must_use]
    pub fn store<S2>(self, store: S2) -> CachedSourceBuilder<P, T, E, A, S2>
    where
        S2: CacheStore<CacheKey<P, A>, T>,
    {
        CachedSourceBuilder {
            source: self.source,
            store: Ok(store),
            time: self.time,
            broadcast_capacity: self.broadcast_capacity,
            _key: PhantomData,
        }
    }

    /// Sets the clock used to stamp and age cache entries.
    ///
    /// Defaults to the system time. Any [`tick::Clock`] qualifies, including one created from a
    /// `tick::ClockControl` in tests.
    #[must_use]
    pub fn time_provider(mut self, time: impl TimeProvider + 'static) -> Self {
        self.time = Arc::new(time);
        self
    }

    /// Sets how many messages the `updates` and `errors` channels buffer per subscriber.
    ///
    /// A subscriber that falls further behind skips the oldest messages. Zero is rejected by
    /// `build`.
    #[must_use]
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Builds the cached source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] if the cache or broadcast capacity is zero.
    pub fn build(self) -> Result<CachedSource<P, T, E, A, S>, ConfigError>
    where
        P: Clone,
        T: Clone,
        E: Clone,
        S: CacheStore<CacheKey<P, A>, T>,
    {
        let store = self.store?;
        let broadcast_capacity =
            NonZeroUsize::new(self.broadcast_capacity).ok_or(ConfigError::ZeroCapacity { what: "broadcast" })?;

        Ok(CachedSource::assemble(self.source, store, self.time, broadcast_capacity))
    }
}
