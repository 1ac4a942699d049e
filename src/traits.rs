//! # Cache Contract
//!
//! Every eviction policy implements [`CoreCache`], so callers can hold a
//! `SimpleCache`, `LruCache`, `LfuCache` or the builder's [`Cache`] wrapper
//! behind the same operation set.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │              StatsAccessor                   │
//!                 │  key_count / hit_count / miss_count          │
//!                 │  lookup_count / evict_count / hit_rate       │
//!                 └──────────────────────┬───────────────────────┘
//!                                        │ supertrait
//!                 ┌──────────────────────▼───────────────────────┐
//!                 │            CoreCache<K, V>                   │
//!                 │                                              │
//!                 │  get(&K)              → Result<V, CacheError>│
//!                 │  set(K, V)                                   │
//!                 │  set_with_expire(K, V, ttl_secs)             │
//!                 │  expire(&K, ttl_secs) → Result<(), _>        │
//!                 │  ttl(&K)              → Result<Ttl, _>       │
//!                 │  del(&K)              → Result<(), _>        │
//!                 │  get_all / keys / len / is_empty / clear     │
//!                 │  contains(&K) / capacity()                   │
//!                 └───────┬──────────────────┬──────────────┬────┘
//!                         │                  │              │
//!                  SimpleCache          LruCache        LfuCache
//! ```
//!
//! ## Shared Semantics
//!
//! | Operation  | Counts hit/miss | Promotes (LRU/LFU) | Removes expired |
//! |------------|-----------------|--------------------|-----------------|
//! | `get`      | yes             | yes                | yes             |
//! | `ttl`      | yes             | yes                | yes             |
//! | `expire`   | yes             | yes                | yes             |
//! | `contains` | no              | no                 | no              |
//! | `get_all`  | yes (per key)   | yes (per key)      | yes             |
//! | `keys`     | yes (per key)   | yes (per key)      | yes             |
//!
//! All methods take `&self`; each cache guards its state with an internal
//! lock, so a cache can be shared across threads behind an `Arc`.
//!
//! [`Cache`]: crate::builder::Cache

use std::collections::HashMap;

use crate::builder::CachePolicy;
use crate::entry::Ttl;
use crate::error::CacheError;
use crate::stats::StatsAccessor;

/// Operations every eviction policy supports.
///
/// # Example
///
/// ```
/// use evictcache::builder::CacheBuilder;
/// use evictcache::traits::CoreCache;
///
/// fn warm<C: CoreCache<u64, String>>(cache: &C, data: &[(u64, &str)]) {
///     for (key, value) in data {
///         cache.set(*key, value.to_string());
///     }
/// }
///
/// let cache = CacheBuilder::new(16).lru().build::<u64, String>().unwrap();
/// warm(&cache, &[(1, "one"), (2, "two")]);
/// assert_eq!(cache.len(), 2);
/// assert_eq!(cache.get(&1).as_deref(), Ok("one"));
/// ```
pub trait CoreCache<K, V>: StatsAccessor + Send + Sync {
    /// Returns a clone of the live value for `key`.
    ///
    /// Counts a hit or a miss. An expired entry is removed and reported as
    /// [`CacheError::NotFound`].
    fn get(&self, key: &K) -> Result<V, CacheError>;

    /// Stores a never-expiring entry, evicting one entry first if a new key
    /// would exceed capacity.
    fn set(&self, key: K, value: V) {
        self.set_with_expire(key, value, 0);
    }

    /// Stores an entry that expires `ttl_secs` from now; `ttl_secs <= 0`
    /// means never.
    fn set_with_expire(&self, key: K, value: V, ttl_secs: i64);

    /// Replaces the TTL of a live entry, keeping its value.
    ///
    /// The lookup behaves like [`get`](Self::get) (counted, promoted).
    fn expire(&self, key: &K, ttl_secs: i64) -> Result<(), CacheError>;

    /// Remaining lifetime of a live entry.
    ///
    /// The lookup behaves like [`get`](Self::get) (counted, promoted).
    fn ttl(&self, key: &K) -> Result<Ttl, CacheError>;

    /// Removes `key`.
    fn del(&self, key: &K) -> Result<(), CacheError>;

    /// Snapshot of every live entry. Each key is re-read with
    /// [`get`](Self::get), so statistics and eviction order are updated.
    fn get_all(&self) -> HashMap<K, V>;

    /// Keys of every live entry, re-validated like [`get_all`](Self::get_all).
    fn keys(&self) -> Vec<K>;

    /// Number of live entries, i.e. `keys().len()`.
    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Hit, miss and eviction counters are kept.
    fn clear(&self);

    /// Whether `key` holds a live entry. Does not count, promote or remove.
    fn contains(&self, key: &K) -> bool;

    /// Configured maximum entry count; `0` means unbounded.
    fn capacity(&self) -> usize;

    /// Policy backing this cache.
    fn policy(&self) -> CachePolicy;
}

/// Declarative cache configuration consumed by
/// [`CacheBuilder::from_config`](crate::builder::CacheBuilder::from_config).
///
/// | Field      | Type          | Default  | Description                          |
/// |------------|---------------|----------|--------------------------------------|
/// | `capacity` | `usize`       | 0        | Max entries; 0 is unbounded (simple) |
/// | `policy`   | `CachePolicy` | `Simple` | Eviction policy                      |
///
/// ```
/// use evictcache::builder::CachePolicy;
/// use evictcache::traits::CacheConfig;
///
/// let config = CacheConfig {
///     capacity: 500,
///     ..Default::default()
/// };
/// assert_eq!(config.capacity, 500);
/// assert_eq!(config.policy, CachePolicy::Simple);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    pub capacity: usize,

    /// Eviction policy to construct.
    pub policy: CachePolicy,
}

impl CacheConfig {
    pub fn new(capacity: usize, policy: CachePolicy) -> Self {
        Self { capacity, policy }
    }
}
