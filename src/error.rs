//! Error types for the evictcache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by lookups and removals when a key is absent or
//!   has expired. This is the only runtime error a cache produces.
//! - [`ConfigError`]: Returned when a cache is constructed with invalid
//!   parameters (zero capacity for a bounded policy, unknown policy name).
//!
//! Keeping the two apart lets callers tell "misconfigured" from "cache miss".
//!
//! ## Example Usage
//!
//! ```
//! use evictcache::builder::CacheBuilder;
//! use evictcache::error::{CacheError, ConfigError};
//! use evictcache::traits::CoreCache;
//!
//! // Zero capacity is fine for the unbounded simple policy...
//! let cache = CacheBuilder::new(0).build::<u32, &str>().unwrap();
//! assert_eq!(cache.get(&1), Err(CacheError::NotFound));
//!
//! // ...but rejected for LRU.
//! let err: ConfigError = CacheBuilder::new(0).lru().build::<u32, &str>().unwrap_err();
//! assert!(err.message().contains("capacity"));
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Runtime error returned by cache operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CacheError {
    /// The key is absent, or was present but had already expired.
    #[error("key not found")]
    NotFound,
}

impl CacheError {
    /// Seconds code reported by `ttl` for this error (`-2` for a missing key).
    #[inline]
    pub fn ttl_secs(&self) -> i64 {
        match self {
            CacheError::NotFound => -2,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheBuilder::build`](crate::builder::CacheBuilder::build),
/// the `try_new` constructors of the bounded policies and
/// [`CachePolicy::from_str`](crate::builder::CachePolicy). Carries a
/// human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use evictcache::clock::SystemClock;
/// use evictcache::policy::lfu::LfuCache;
///
/// let err = LfuCache::<u64, u64>::try_new(0, Arc::new(SystemClock)).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- CacheError -------------------------------------------------------

    #[test]
    fn not_found_display() {
        assert_eq!(CacheError::NotFound.to_string(), "key not found");
    }

    #[test]
    fn not_found_ttl_code() {
        assert_eq!(CacheError::NotFound.ttl_secs(), -2);
    }

    #[test]
    fn cache_error_implements_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<CacheError>();
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be > 0");
        assert_eq!(err.to_string(), "capacity must be > 0");
    }

    #[test]
    fn config_message_accessor() {
        let err = ConfigError::new("unknown policy `mru`");
        assert_eq!(err.message(), "unknown policy `mru`");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn config_implements_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<ConfigError>();
    }
}
