// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Errors returned by cached source calls.

use sourcecache_flight::ProducerPanicked;

/// Why a cached source call produced no value.
///
/// `E` is the source's own error type. It reaches the caller unchanged inside
/// [`Error::Source`]; sharing and caching never rewrite it.
///
/// # Examples
///
/// ```
/// use sourcecache::Error;
///
/// let error: Error<String> = Error::Source("timeout".to_string());
/// assert_eq!(error.source_error().map(String::as_str), Some("timeout"));
/// assert!(Error::<String>::NotCached.is_not_cached());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error<E> {
    /// The source failed.
    #[error("source failed: {0}")]
    Source(#[source] E),

    /// [`FromCache::Only`](crate::FromCache::Only) found no usable cache entry.
    #[error("no usable entry in cache")]
    NotCached,

    /// The source panicked.
    #[error(transparent)]
    Panicked(#[from] ProducerPanicked),
}

impl<E> Error<E> {
    /// Returns the source's error, if this is a source failure.
    #[must_use]
    pub fn source_error(&self) -> Option<&E> {
        match self {
            Self::Source(error) => Some(error),
            _ => None,
        }
    }

    /// Consumes the error and returns the source's error, if this is a source failure.
    #[must_use]
    pub fn into_source_error(self) -> Option<E> {
        match self {
            Self::Source(error) => Some(error),
            _ => None,
        }
    }

    /// Whether this is a cache miss in [`FromCache::Only`](crate::FromCache::Only) mode.
    #[must_use]
    pub fn is_not_cached(&self) -> bool {
        matches!(self, Self::NotCached)
    }
}
