// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{ops::Deref, time::Duration};

/// A cached value with the wall-clock time it was stored at.
///
/// The timestamp is in milliseconds since the UNIX epoch and is optional so that stores
/// can hold entries inserted without time tracking. Such entries only satisfy lookups
/// that set no maximum age.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use sourcecache_tier::CacheEntry;
///
/// let entry = CacheEntry::with_timestamp(42, 1_000);
/// assert_eq!(*entry.value(), 42);
/// assert!(entry.is_fresh(Some(Duration::from_millis(500)), 1_499));
/// assert!(!entry.is_fresh(Some(Duration::from_millis(500)), 1_500));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry<V> {
    value: V,
    inserted_at: Option<i64>,
}

impl<V> CacheEntry<V> {
    /// Creates an entry without a timestamp.
    ///
    /// # Examples
    ///
    /// ```
    /// use sourcecache_tier::CacheEntry;
    ///
    /// let entry = CacheEntry::new("value");
    /// assert!(entry.inserted_at().is_none());
    /// ```
    pub fn new(value: V) -> Self {
        Self { value, inserted_at: None }
    }

    /// Creates an entry stamped with `millis` since the UNIX epoch.
    pub fn with_timestamp(value: V, millis: i64) -> Self {
        Self {
            value,
            inserted_at: Some(millis),
        }
    }

    /// Returns the insertion time in milliseconds, if the entry was stamped.
    #[must_use]
    pub fn inserted_at(&self) -> Option<i64> {
        self.inserted_at
    }

    /// Returns a reference to the cached value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry and returns the inner value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }

    /// Reports whether this entry may still be served at `now_millis`.
    ///
    /// Without `max_age` every entry is fresh. With it, the entry must carry a timestamp and
    /// its age must be strictly below `max_age`: an entry exactly `max_age` old is stale.
    /// An entry stamped in the future (clock moved backwards) counts as fresh.
    #[must_use]
    pub fn is_fresh(&self, max_age: Option<Duration>, now_millis: i64) -> bool {
        let Some(max_age) = max_age else {
            return true;
        };
        let Some(inserted_at) = self.inserted_at else {
            return false;
        };

        match u128::try_from(now_millis.saturating_sub(inserted_at)) {
            Ok(age) => age < max_age.as_millis(),
            Err(_) => true,
        }
    }
}

impl<V> Deref for CacheEntry<V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<V> From<V> for CacheEntry<V> {
    fn from(value: V) -> Self {
        Self::new(value)
    }
}
