// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Coalesces concurrent requests for the same key into one in-flight execution.
//!
//! This crate provides [`Deduplicator`], the registry `sourcecache` uses to make sure that
//! callers asking for the same key at the same time observe exactly one run of the producer.
//! The first caller for a key starts the producer; every caller arriving while it is still
//! registered attaches to it and receives a clone of its outcome.
//!
//! # Example
//!
//! ```
//! use sourcecache_flight::Deduplicator;
//!
//! # async fn example() {
//! let flights: Deduplicator<&str, String> = Deduplicator::new();
//!
//! let first = flights.run_shared("user:123", || async { "loaded".to_string() });
//! // Attaches to the execution registered above; this producer never runs.
//! let second = flights.run_shared("user:123", || async { "never runs".to_string() });
//!
//! let (a, b) = futures_util::future::join(first, second).await;
//! assert_eq!(a, Ok("loaded".to_string()));
//! assert_eq!(b, Ok("loaded".to_string()));
//! assert_eq!(flights.ongoing_count(), 0);
//! # }
//! ```
//!
//! # Registration
//!
//! [`Deduplicator::run_shared`] registers (or attaches) synchronously when it is called, not
//! when the returned future is first polled. The registry lock is only held for that lookup
//! and for the final removal; the producer always runs without it.
//!
//! # Cancellation and Panic Safety
//!
//! - The execution is driven by whichever attached caller polls it. Dropping one caller does
//!   not cancel it while others remain attached; dropping the last one does.
//! - The registry entry is removed exactly once, either right after the producer settles or
//!   when the execution is dropped, and never removes a newer execution for the same key.
//! - A panicking producer is caught and reported to every attached caller as
//!   [`ProducerPanicked`]; the registry stays consistent.

use std::{
    any::Any,
    collections::HashMap,
    fmt::Debug,
    hash::Hash,
    panic::AssertUnwindSafe,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use ahash::RandomState;
use futures_util::{
    FutureExt,
    future::{BoxFuture, WeakShared},
};
use parking_lot::Mutex;

/// Outcome delivered to every caller attached to one execution.
pub type Outcome<T> = Result<T, ProducerPanicked>;

type Work<T> = BoxFuture<'static, Outcome<T>>;
type Registry<K, T> = Mutex<HashMap<K, Flight<T>, RandomState>>;

/// The producer panicked instead of returning a value.
///
/// Every caller attached to the panicking execution receives a clone of this error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("producer panicked: {message}")]
pub struct ProducerPanicked {
    message: String,
}

impl ProducerPanicked {
    /// Builds the error from a payload caught with `catch_unwind`.
    #[must_use]
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&'static str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<non-string panic payload>".to_string());

        Self { message }
    }

    /// Returns the panic message, or a placeholder when the payload was not a string.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

struct Flight<T> {
    id: u64,
    handle: WeakShared<Work<T>>,
}

/// Registry of in-flight executions keyed by request.
///
/// See the [crate documentation](crate) for the sharing and cancellation rules.
pub struct Deduplicator<K, T> {
    registry: Arc<Registry<K, T>>,
    next_id: AtomicU64,
}

impl<K, T> Default for Deduplicator<K, T> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::with_hasher(RandomState::new()))),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<K, T> Debug for Deduplicator<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deduplicator")
            .field("ongoing", &self.registry.lock().len())
            .finish_non_exhaustive()
    }
}

impl<K, T> Deduplicator<K, T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of executions currently registered.
    ///
    /// Zero once every started execution has settled or been dropped.
    #[must_use]
    pub fn ongoing_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Runs `producer` without consulting or touching the registry.
    ///
    /// Concurrent exclusive runs never share work, and dropping the returned future cancels
    /// only this run.
    ///
    /// # Errors
    ///
    /// Returns [`ProducerPanicked`] if the producer panics.
    pub async fn run_exclusive<F, Fut>(&self, producer: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        AssertUnwindSafe(async move { producer().await })
            .catch_unwind()
            .await
            .map_err(|payload| ProducerPanicked::from_payload(&*payload))
    }
}

impl<K, T> Deduplicator<K, T>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Attaches to the execution registered for `key`, or starts `producer` as a new one.
    ///
    /// `producer` is only invoked when no execution for `key` is registered. Every future
    /// returned for the same execution resolves to a clone of the same outcome.
    ///
    /// The returned future does not borrow the registry and can be moved into a spawned task.
    pub fn run_shared<F, Fut>(&self, key: K, producer: F) -> impl Future<Output = Outcome<T>> + Send + use<K, T, F, Fut>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut registry = self.registry.lock();

        if let Some(shared) = registry.get(&key).and_then(|flight| flight.handle.upgrade()) {
            tracing::trace!(ongoing = registry.len(), "attached to in-flight execution");
            return shared;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let guard = RegistryGuard {
            registry: Arc::downgrade(&self.registry),
            key: key.clone(),
            id,
            released: AtomicBool::new(false),
        };

        let work: Work<T> = async move {
            let outcome = AssertUnwindSafe(async move { producer().await })
                .catch_unwind()
                .await
                .map_err(|payload| ProducerPanicked::from_payload(&*payload));
            guard.release();
            outcome
        }
        .boxed();
        let shared = work.shared();

        // A fresh `Shared` has not completed, so it always downgrades.
        if let Some(handle) = shared.downgrade() {
            registry.insert(key, Flight { id, handle });
        }
        tracing::trace!(flight = id, ongoing = registry.len(), "started execution");

        shared
    }
}

/// Removes one execution from the registry, exactly once.
///
/// Released explicitly when the producer settles, and from `Drop` when the execution is
/// dropped before that. Only the registry entry carrying the same id is removed.
struct RegistryGuard<K: Eq + Hash, T> {
    registry: Weak<Registry<K, T>>,
    key: K,
    id: u64,
    released: AtomicBool,
}

impl<K: Eq + Hash, T> RegistryGuard<K, T> {
    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        let mut flights = registry.lock();
        if flights.get(&self.key).is_some_and(|flight| flight.id == self.id) {
            flights.remove(&self.key);
            tracing::trace!(flight = self.id, ongoing = flights.len(), "removed execution");
        }
    }
}

impl<K: Eq + Hash, T> Drop for RegistryGuard<K, T> {
    fn drop(&mut self) {
        self.release();
    }
}
