// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache construction.

/// Invalid construction parameters.
///
/// Configuration errors are reported when a store or source is built, never later when it
/// is used.
///
/// # Example
///
/// ```
/// use sourcecache_tier::ConfigError;
///
/// let error = ConfigError::ZeroCapacity { what: "cache" };
/// assert_eq!(error.to_string(), "cache capacity must be greater than zero");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A capacity was configured as zero.
    #[error("{what} capacity must be greater than zero")]
    ZeroCapacity {
        /// Which capacity was rejected.
        what: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_capacity() {
        let error = ConfigError::ZeroCapacity { what: "broadcast" };
        assert_eq!(format!("{error}"), "broadcast capacity must be greater than zero");
    }

    #[test]
    fn debug_contains_variant() {
        let error = ConfigError::ZeroCapacity { what: "cache" };
        assert!(format!("{error:?}").contains("ZeroCapacity"));
    }
}
