// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Composite address of a cached value: the request parameters plus an optional
/// extra discriminator.
///
/// Both parts take part in equality and hashing, so two keys with the same parameters
/// but different discriminators address different entries. Use immutable value types for
/// both parts; a key whose hash changes while stored can never be found again.
///
/// # Examples
///
/// ```
/// use sourcecache_tier::CacheKey;
///
/// let plain: CacheKey<&str, u8> = CacheKey::new("user:1");
/// let tagged = CacheKey::with_additional("user:1", 2_u8);
///
/// assert_eq!(plain.params(), tagged.params());
/// assert_ne!(plain, tagged);
/// assert_eq!(tagged.additional(), Some(&2));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey<P, A = ()> {
    params: P,
    additional: Option<A>,
}

impl<P, A> CacheKey<P, A> {
    /// Creates a key from request parameters alone.
    #[must_use]
    pub fn new(params: P) -> Self {
        Self { params, additional: None }
    }

    /// Creates a key from request parameters and an extra discriminator.
    #[must_use]
    pub fn with_additional(params: P, additional: A) -> Self {
        Self {
            params,
            additional: Some(additional),
        }
    }

    /// Returns the request parameters.
    #[must_use]
    pub fn params(&self) -> &P {
        &self.params
    }

    /// Returns the extra discriminator, if any.
    #[must_use]
    pub fn additional(&self) -> Option<&A> {
        self.additional.as_ref()
    }

    /// Consumes the key and returns the request parameters.
    #[must_use]
    pub fn into_params(self) -> P {
        self.params
    }
}

impl<P, A> From<P> for CacheKey<P, A> {
    fn from(params: P) -> Self {
        Self::new(params)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn discriminator_separates_keys() {
        let mut keys = HashSet::new();
        keys.insert(CacheKey::<_, u32>::new("a"));
        keys.insert(CacheKey::with_additional("a", 1));
        keys.insert(CacheKey::with_additional("a", 2));
        keys.insert(CacheKey::with_additional("a", 1));

        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn from_params_has_no_discriminator() {
        let key: CacheKey<i32, String> = 7.into();
        assert_eq!(*key.params(), 7);
        assert!(key.additional().is_none());
        assert_eq!(key.into_params(), 7);
    }
}
