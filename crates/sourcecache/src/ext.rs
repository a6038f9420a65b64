// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Conveniences composed from lookups, loads and the update channel.

use std::hash::Hash;

use futures::{
    StreamExt,
    future,
    stream::{self, BoxStream},
};
use sourcecache_tier::{CacheKey, CacheStore};

use crate::{CacheRequirement, CachedSource, CachedSourceResult, Error};

impl<P, T, E, A, S> CachedSource<P, T, E, A, S>
where
    P: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    A: Clone + Eq + Hash + Send + Sync + 'static,
    S: CacheStore<CacheKey<P, A>, T> + 'static,
{
    /// Serves the cached value for `params` if it is usable and `accept` approves it,
    /// otherwise calls the source.
    ///
    /// # Errors
    ///
    /// Returns the source failure when the source is called and fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use sourcecache::{CacheRequirement, CachedSource, FromCache};
    ///
    /// # futures::executor::block_on(async {
    /// let source = CachedSource::new(|_: ()| async { Ok::<_, String>(vec![1, 2, 3]) });
    ///
    /// // Nothing cached yet, so this calls the source.
    /// let items = source.get_or_request((), |items| !items.is_empty(), CacheRequirement::new()).await;
    /// assert_eq!(items, Ok(vec![1, 2, 3]));
    /// # });
    /// ```
    pub async fn get_or_request(
        &self,
        params: P,
        accept: impl FnOnce(&T) -> bool + Send,
        requirement: CacheRequirement,
    ) -> Result<T, Error<E>> {
        let key = CacheKey::new(params);

        if let Some(cached) = self.lookup(&key, requirement).await {
            if accept(cached.value()) {
                return Ok(cached.into_value());
            }
            tracing::debug!("cached value rejected, calling source");
        }

        self.load(key, requirement).await.map(CachedSourceResult::into_value)
    }

    /// Requests `params` once and keeps observing later results for it.
    ///
    /// The returned stream merges every [`update`](Self::updates) published for `params` with
    /// one source call that is retried up to `retries` more times while it fails. Consecutive
    /// equal values are yielded once. A call that still fails after its retries is yielded as
    /// an error; observation continues afterwards.
    ///
    /// The subscription starts when this method is called, so an update published by the
    /// request itself is never missed.
    pub fn request_and_observe(&self, params: P, retries: usize) -> BoxStream<'_, Result<T, Error<E>>>
    where
        T: PartialEq,
    {
        let wanted = params.clone();
        let observed = self
            .updates()
            .filter_map(move |(updated, result)| future::ready((updated == wanted).then(|| Ok(result.into_value()))));

        let request = stream::once(self.load_with_retries(CacheKey::new(params), retries))
            .map(|outcome| outcome.map(CachedSourceResult::into_value));

        stream::select(observed, request)
            .scan(None::<T>, |last, item| {
                let next = match item {
                    Ok(value) if last.as_ref() == Some(&value) => None,
                    Ok(value) => {
                        *last = Some(value.clone());
                        Some(Ok(value))
                    }
                    Err(error) => Some(Err(error)),
                };
                future::ready(Some(next))
            })
            .filter_map(future::ready)
            .boxed()
    }

    async fn load_with_retries(&self, key: CacheKey<P, A>, retries: usize) -> Result<CachedSourceResult<T>, Error<E>> {
        let mut attempt = 0;
        loop {
            match self.load(key.clone(), CacheRequirement::new()).await {
                Err(_) if attempt < retries => {
                    attempt += 1;
                    tracing::debug!(attempt, retries, "source call failed, retrying");
                }
                outcome => return outcome,
            }
        }
    }
}
