//! Unified cache builder for all eviction policies.
//!
//! Picks a policy from declarative configuration and wraps the result in
//! [`Cache`], which implements [`CoreCache`] by dispatching to the concrete
//! policy.
//!
//! ## Example
//!
//! ```rust
//! use evictcache::builder::{CacheBuilder, CachePolicy};
//! use evictcache::traits::CoreCache;
//!
//! let cache = CacheBuilder::new(100)
//!     .policy(CachePolicy::Lru)
//!     .build::<u64, String>()
//!     .unwrap();
//! cache.set(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Ok("hello".to_string()));
//!
//! // Policies can also be selected by name.
//! let cache = CacheBuilder::new(8).evict_type("LFU").build::<u64, u64>().unwrap();
//! assert_eq!(cache.policy(), CachePolicy::Lfu);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::entry::Ttl;
use crate::error::{CacheError, ConfigError};
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::policy::simple::SimpleCache;
use crate::stats::{CacheStats, StatsAccessor};
use crate::traits::{CacheConfig, CoreCache};

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Unordered; evicts an expired entry if any, otherwise an arbitrary one.
    #[default]
    Simple,
    /// Least Recently Used eviction.
    Lru,
    /// Least Frequently Used eviction (bucket-based, O(1)).
    Lfu,
}

impl CachePolicy {
    pub const ALL: [CachePolicy; 3] = [CachePolicy::Simple, CachePolicy::Lru, CachePolicy::Lfu];

    /// Lower-case selector accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            CachePolicy::Simple => "simple",
            CachePolicy::Lru => "lru",
            CachePolicy::Lfu => "lfu",
        }
    }

    /// Whether the policy rejects a zero capacity.
    pub fn is_bounded(&self) -> bool {
        !matches!(self, CachePolicy::Simple)
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CachePolicy {
    type Err = ConfigError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selector = s.trim();
        CachePolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(selector))
            .ok_or_else(|| ConfigError::new(format!("unknown eviction policy `{selector}`")))
    }
}

/// Unified cache wrapper that provides a consistent API regardless of policy.
pub struct Cache<K, V> {
    inner: CacheInner<K, V>,
}

enum CacheInner<K, V> {
    Simple(SimpleCache<K, V>),
    Lru(LruCache<K, V>),
    Lfu(LfuCache<K, V>),
}

macro_rules! dispatch {
    ($cache:expr, $inner:ident => $body:expr) => {
        match &$cache.inner {
            CacheInner::Simple($inner) => $body,
            CacheInner::Lru($inner) => $body,
            CacheInner::Lfu($inner) => $body,
        }
    };
}

impl<K, V> Cache<K, V> {
    /// The LRU cache behind this wrapper, if any.
    pub fn as_lru(&self) -> Option<&LruCache<K, V>> {
        match &self.inner {
            CacheInner::Lru(lru) => Some(lru),
            _ => None,
        }
    }

    /// The LFU cache behind this wrapper, if any.
    pub fn as_lfu(&self) -> Option<&LfuCache<K, V>> {
        match &self.inner {
            CacheInner::Lfu(lfu) => Some(lfu),
            _ => None,
        }
    }
}

impl<K, V> CoreCache<K, V> for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Result<V, CacheError> {
        dispatch!(self, cache => cache.get(key))
    }

    fn set(&self, key: K, value: V) {
        dispatch!(self, cache => cache.set(key, value))
    }

    fn set_with_expire(&self, key: K, value: V, ttl_secs: i64) {
        dispatch!(self, cache => cache.set_with_expire(key, value, ttl_secs))
    }

    fn expire(&self, key: &K, ttl_secs: i64) -> Result<(), CacheError> {
        dispatch!(self, cache => cache.expire(key, ttl_secs))
    }

    fn ttl(&self, key: &K) -> Result<Ttl, CacheError> {
        dispatch!(self, cache => cache.ttl(key))
    }

    fn del(&self, key: &K) -> Result<(), CacheError> {
        dispatch!(self, cache => cache.del(key))
    }

    fn get_all(&self) -> HashMap<K, V> {
        dispatch!(self, cache => cache.get_all())
    }

    fn keys(&self) -> Vec<K> {
        dispatch!(self, cache => cache.keys())
    }

    fn len(&self) -> usize {
        dispatch!(self, cache => cache.len())
    }

    fn clear(&self) {
        dispatch!(self, cache => cache.clear())
    }

    fn contains(&self, key: &K) -> bool {
        dispatch!(self, cache => cache.contains(key))
    }

    fn capacity(&self) -> usize {
        dispatch!(self, cache => cache.capacity())
    }

    fn policy(&self) -> CachePolicy {
        match &self.inner {
            CacheInner::Simple(_) => CachePolicy::Simple,
            CacheInner::Lru(_) => CachePolicy::Lru,
            CacheInner::Lfu(_) => CachePolicy::Lfu,
        }
    }
}

impl<K, V> StatsAccessor for Cache<K, V> {
    fn counters(&self) -> &CacheStats {
        dispatch!(self, cache => cache.counters())
    }
}

impl<K, V> fmt::Display for Cache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, cache => fmt::Display::fmt(cache, f))
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, cache => fmt::Debug::fmt(cache, f))
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    capacity: usize,
    policy: Result<CachePolicy, ConfigError>,
    clock: Option<Arc<dyn Clock>>,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity and the
    /// default (simple) policy.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            policy: Ok(CachePolicy::default()),
            clock: None,
        }
    }

    /// Builder seeded from a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity).policy(config.policy)
    }

    pub fn policy(mut self, policy: CachePolicy) -> Self {
        self.policy = Ok(policy);
        self
    }

    pub fn simple(self) -> Self {
        self.policy(CachePolicy::Simple)
    }

    pub fn lru(self) -> Self {
        self.policy(CachePolicy::Lru)
    }

    pub fn lfu(self) -> Self {
        self.policy(CachePolicy::Lfu)
    }

    /// Selects the policy by name (`"simple"`, `"lru"`, `"lfu"`).
    ///
    /// An unknown name is reported by [`build`](Self::build).
    pub fn evict_type(mut self, name: &str) -> Self {
        self.policy = name.parse();
        self
    }

    /// Overrides the time source (defaults to [`SystemClock`]).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build a cache with the configured policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown policy name, or a zero
    /// capacity with a bounded policy.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use evictcache::builder::CacheBuilder;
    /// use evictcache::clock::ManualClock;
    /// use evictcache::traits::CoreCache;
    ///
    /// let clock = Arc::new(ManualClock::new(0));
    /// let cache = CacheBuilder::new(10)
    ///     .lfu()
    ///     .clock(clock.clone())
    ///     .build::<&str, u32>()
    ///     .unwrap();
    ///
    /// cache.set_with_expire("k", 1, 5);
    /// clock.advance(6);
    /// assert!(cache.get(&"k").is_err());
    ///
    /// assert!(CacheBuilder::new(10).evict_type("mru").build::<u8, u8>().is_err());
    /// ```
    pub fn build<K, V>(self) -> Result<Cache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let policy = self.policy.inspect_err(|err| {
            tracing::warn!(error = %err, "rejected cache configuration");
        })?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let capacity = self.capacity;

        let inner = match policy {
            CachePolicy::Simple => CacheInner::Simple(SimpleCache::new(capacity, clock)),
            CachePolicy::Lru => CacheInner::Lru(LruCache::try_new(capacity, clock).inspect_err(
                |err| tracing::warn!(%policy, capacity, error = %err, "rejected cache configuration"),
            )?),
            CachePolicy::Lfu => CacheInner::Lfu(LfuCache::try_new(capacity, clock).inspect_err(
                |err| tracing::warn!(%policy, capacity, error = %err, "rejected cache configuration"),
            )?),
        };

        tracing::debug!(%policy, capacity, "built cache");
        Ok(Cache { inner })
    }
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_all_policies_basic_ops() {
        for policy in CachePolicy::ALL {
            let cache = CacheBuilder::new(10)
                .policy(policy)
                .build::<u64, String>()
                .unwrap();

            cache.set(1, "one".to_string());
            cache.set(2, "two".to_string());

            assert_eq!(cache.get(&1), Ok("one".to_string()));
            assert_eq!(cache.get(&2), Ok("two".to_string()));
            assert_eq!(cache.get(&3), Err(CacheError::NotFound));

            assert!(cache.contains(&1));
            assert!(!cache.contains(&99));

            assert_eq!(cache.len(), 2);
            assert!(!cache.is_empty());
            assert_eq!(cache.policy(), policy);
            assert_eq!(cache.capacity(), 10);

            cache.set(1, "ONE".to_string());
            assert_eq!(cache.get(&1), Ok("ONE".to_string()));

            cache.clear();
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn test_capacity_enforcement() {
        let cache = CacheBuilder::new(2).lru().build::<u64, String>().unwrap();

        cache.set(1, "one".to_string());
        cache.set(2, "two".to_string());
        cache.set(3, "three".to_string());

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn test_zero_capacity() {
        assert!(CacheBuilder::new(0).build::<u8, u8>().is_ok());
        assert!(CacheBuilder::new(0).lru().build::<u8, u8>().is_err());
        assert!(CacheBuilder::new(0).lfu().build::<u8, u8>().is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("simple".parse::<CachePolicy>(), Ok(CachePolicy::Simple));
        assert_eq!(" LRU ".parse::<CachePolicy>(), Ok(CachePolicy::Lru));
        assert_eq!("Lfu".parse::<CachePolicy>(), Ok(CachePolicy::Lfu));
        let err = "arc".parse::<CachePolicy>().unwrap_err();
        assert!(err.message().contains("arc"));
    }

    #[test]
    fn test_policy_display_round_trips() {
        for policy in CachePolicy::ALL {
            assert_eq!(policy.to_string().parse::<CachePolicy>(), Ok(policy));
        }
    }

    #[test]
    fn test_evict_type_selects_policy() {
        let cache = CacheBuilder::new(4).evict_type("lru").build::<u8, u8>().unwrap();
        assert!(cache.as_lru().is_some());
        assert!(cache.as_lfu().is_none());

        let err = CacheBuilder::new(4).evict_type("fifo").build::<u8, u8>().unwrap_err();
        assert!(err.message().contains("fifo"));
    }

    #[test]
    fn test_later_policy_call_overrides_bad_name() {
        let cache = CacheBuilder::new(4)
            .evict_type("bogus")
            .lfu()
            .build::<u8, u8>()
            .unwrap();
        assert_eq!(cache.policy(), CachePolicy::Lfu);
    }

    #[test]
    fn test_from_config() {
        let config = CacheConfig::new(3, CachePolicy::Lfu);
        let cache = CacheBuilder::from_config(&config).build::<u8, u8>().unwrap();
        assert_eq!(cache.capacity(), 3);
        assert!(cache.as_lfu().is_some());

        let default = CacheBuilder::default().build::<u8, u8>().unwrap();
        assert_eq!(default.policy(), CachePolicy::Simple);
        assert_eq!(default.capacity(), 0);
    }

    #[test]
    fn test_clock_override_drives_expiry() {
        let clock = Arc::new(ManualClock::new(100));
        let cache = CacheBuilder::new(4)
            .lru()
            .clock(clock.clone())
            .build::<u8, u8>()
            .unwrap();
        cache.set_with_expire(1, 1, 2);
        assert_eq!(cache.ttl(&1), Ok(Ttl::Remaining(2)));
        clock.advance(3);
        assert_eq!(cache.ttl(&1), Err(CacheError::NotFound));
    }

    #[test]
    fn test_display_delegates() {
        let cache = CacheBuilder::new(5).lfu().build::<u8, u8>().unwrap();
        cache.set(1, 1);
        assert_eq!(cache.to_string(), "LfuCache:[size:5, count:1]");
        let simple = CacheBuilder::new(0).build::<u8, u8>().unwrap();
        assert_eq!(simple.to_string(), "SimpleCache:[size:0, count:0]");
    }

    #[test]
    fn test_stats_through_wrapper() {
        let cache = CacheBuilder::new(4).build::<u8, u8>().unwrap();
        cache.set(1, 1);
        let _ = cache.get(&1);
        let _ = cache.get(&2);
        assert_eq!(cache.stats().hit_count, 1);
        assert_eq!(cache.stats().miss_count, 1);
        assert_eq!(cache.hit_rate(), 0.5);
    }
}
