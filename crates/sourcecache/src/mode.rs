// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-call cache policy.

use std::time::Duration;

/// How a call combines the cache with the source.
///
/// Every mode that reaches the source writes a successful result back to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FromCache {
    /// Always call the source; the cache is only written.
    #[default]
    Never,

    /// Serve a fresh cached value if there is one, otherwise call the source.
    IfHave,

    /// Call the source; if it fails, serve a fresh cached value instead of the failure.
    IfFailed,

    /// Emit a fresh cached value first (if any), then call the source and emit its outcome.
    ///
    /// This is the only mode that can produce two items.
    CachedThenLoad,

    /// Serve a fresh cached value or fail with [`Error::NotCached`](crate::Error::NotCached).
    /// The source is never called.
    Only,
}

/// Freshness and sharing options for one call.
///
/// The default accepts cached entries of any age and shares in-flight source calls.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use sourcecache::CacheRequirement;
///
/// let requirement = CacheRequirement::new()
///     .with_max_age(Duration::from_secs(30))
///     .with_shared_ongoing(false);
///
/// assert_eq!(requirement.max_age(), Some(Duration::from_secs(30)));
/// assert!(!requirement.share_ongoing_request());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheRequirement {
    max_age: Option<Duration>,
    share_ongoing_request: bool,
}

impl CacheRequirement {
    /// Creates the default requirement: no age limit, sharing enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_age: None,
            share_ongoing_request: true,
        }
    }

    /// Only accept cached entries younger than `max_age`.
    ///
    /// An entry exactly `max_age` old is stale, and entries stored without a timestamp never
    /// qualify.
    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Whether a source call may attach to an identical call already in flight.
    #[must_use]
    pub const fn with_shared_ongoing(mut self, share: bool) -> Self {
        self.share_ongoing_request = share;
        self
    }

    /// The maximum age a cached entry may have to be served, if any.
    #[must_use]
    pub const fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Whether the call may attach to an in-flight source call for the same key.
    #[must_use]
    pub const fn share_ongoing_request(&self) -> bool {
        self.share_ongoing_request
    }
}

impl Default for CacheRequirement {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Duration> for CacheRequirement {
    fn from(max_age: Duration) -> Self {
        Self::new().with_max_age(max_age)
    }
}
