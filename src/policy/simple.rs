//! # Simple (unordered) cache
//!
//! A hash map of entries with no access ordering. When a bounded cache is
//! full, inserting a new key evicts one entry: an already expired entry if
//! one exists, otherwise whichever entry the map yields first.
//!
//! ```text
//!   SimpleCache<K, V>
//!   ┌───────────────────────────────────────────────┐
//!   │ RwLock<SimpleCore>                            │
//!   │   FxHashMap<K, CacheEntry<V>>                 │
//!   │   capacity (0 = unbounded)                    │
//!   ├───────────────────────────────────────────────┤
//!   │ Arc<dyn Clock>            CacheStats          │
//!   └───────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//!
//! Lookups (`get`, `ttl`, `contains`, the key snapshot) only need the shared
//! lock. When a lookup finds an expired entry it drops the shared lock, takes
//! the exclusive one, looks the key up again and removes it if it is still
//! expired. A concurrent `set` in between wins: the re-check then reports the
//! fresh entry as a hit.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::builder::CachePolicy;
use crate::clock::{Clock, Timestamp};
use crate::entry::{CacheEntry, Ttl};
use crate::error::CacheError;
use crate::policy::{Inserted, Lookup};
use crate::stats::{CacheStats, StatsAccessor};
use crate::traits::CoreCache;

/// Upper bound on slots reserved up front for a bounded cache.
const MAX_PREALLOC: usize = 4096;

#[derive(Debug)]
pub(crate) struct SimpleCore<K, V> {
    items: FxHashMap<K, CacheEntry<V>>,
    capacity: usize,
}

impl<K, V> SimpleCore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            items: FxHashMap::with_capacity_and_hasher(
                capacity.min(MAX_PREALLOC),
                Default::default(),
            ),
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Reads a live entry without removing anything.
    pub(crate) fn peek_with<T>(
        &self,
        key: &K,
        now: Timestamp,
        f: impl FnOnce(&CacheEntry<V>) -> T,
    ) -> Lookup<T> {
        match self.items.get(key) {
            None => Lookup::Absent,
            Some(entry) if entry.is_expired(now) => Lookup::Expired,
            Some(entry) => Lookup::Hit(f(entry)),
        }
    }

    /// Like [`peek_with`](Self::peek_with), but removes an expired entry.
    pub(crate) fn lookup_with<T>(
        &mut self,
        key: &K,
        now: Timestamp,
        f: impl FnOnce(&mut CacheEntry<V>) -> T,
    ) -> Lookup<T> {
        match self.items.get(key) {
            None => return Lookup::Absent,
            Some(entry) if entry.is_expired(now) => {
                self.items.remove(key);
                return Lookup::Expired;
            },
            Some(_) => {},
        }
        match self.items.get_mut(key) {
            Some(entry) => Lookup::Hit(f(entry)),
            None => Lookup::Absent,
        }
    }

    pub(crate) fn insert(
        &mut self,
        key: K,
        value: V,
        expire_at: Timestamp,
        now: Timestamp,
    ) -> Inserted<K> {
        if let Some(entry) = self.items.get_mut(&key) {
            entry.overwrite(value, expire_at);
            return Inserted::Updated;
        }

        let evicted = if self.capacity > 0 && self.items.len() >= self.capacity {
            self.victim(now).inspect(|victim| {
                self.items.remove(victim);
            })
        } else {
            None
        };
        self.items.insert(key, CacheEntry::new(value, expire_at));
        Inserted::Added { evicted }
    }

    /// An expired entry if there is one, otherwise the first key in map order.
    fn victim(&self, now: Timestamp) -> Option<K> {
        self.items
            .iter()
            .find(|(_, entry)| entry.is_expired(now))
            .or_else(|| self.items.iter().next())
            .map(|(key, _)| key.clone())
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        self.items.remove(key)
    }

    pub(crate) fn keys(&self) -> Vec<K> {
        self.items.keys().cloned().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

/// Thread-safe cache with arbitrary-order eviction.
///
/// A capacity of `0` makes the cache unbounded.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use evictcache::clock::ManualClock;
/// use evictcache::policy::simple::SimpleCache;
/// use evictcache::traits::CoreCache;
///
/// let clock = Arc::new(ManualClock::new(0));
/// let cache = SimpleCache::new(2, clock.clone());
///
/// cache.set_with_expire("session", 42, 10);
/// assert_eq!(cache.get(&"session"), Ok(42));
///
/// clock.advance(11);
/// assert!(cache.get(&"session").is_err());
/// ```
pub struct SimpleCache<K, V> {
    inner: RwLock<SimpleCore<K, V>>,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
    capacity: usize,
}

impl<K, V> SimpleCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(SimpleCore::new(capacity)),
            clock,
            stats: CacheStats::new(),
            capacity,
        }
    }

    /// Shared-lock lookup, escalating to the exclusive lock only to drop an
    /// expired entry.
    fn read_live<T>(
        &self,
        key: &K,
        now: Timestamp,
        f: impl Fn(&CacheEntry<V>) -> T,
    ) -> Result<T, CacheError> {
        let peeked = self.inner.read().peek_with(key, now, &f);
        if !matches!(peeked, Lookup::Expired) {
            return peeked.settle(&self.stats, CachePolicy::Simple);
        }

        let mut core = self.inner.write();
        core.lookup_with(key, now, |entry| f(&*entry))
            .settle(&self.stats, CachePolicy::Simple)
    }
}

impl<K, V> CoreCache<K, V> for SimpleCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Result<V, CacheError> {
        self.read_live(key, self.clock.now(), |entry| entry.value.clone())
    }

    fn set_with_expire(&self, key: K, value: V, ttl_secs: i64) {
        let now = self.clock.now();
        let expire_at = self.clock.expire_at(ttl_secs);
        let mut core = self.inner.write();
        core.insert(key, value, expire_at, now)
            .record(&self.stats, CachePolicy::Simple, self.capacity);
    }

    fn expire(&self, key: &K, ttl_secs: i64) -> Result<(), CacheError> {
        let now = self.clock.now();
        let expire_at = self.clock.expire_at(ttl_secs);
        let mut core = self.inner.write();
        core.lookup_with(key, now, |entry| entry.expire_at = expire_at)
            .settle(&self.stats, CachePolicy::Simple)
    }

    fn ttl(&self, key: &K) -> Result<Ttl, CacheError> {
        let now = self.clock.now();
        self.read_live(key, now, |entry| entry.ttl(now))
    }

    fn del(&self, key: &K) -> Result<(), CacheError> {
        match self.inner.write().remove(key) {
            Some(_) => {
                self.stats.decr_key_count();
                Ok(())
            },
            None => Err(CacheError::NotFound),
        }
    }

    fn get_all(&self) -> HashMap<K, V> {
        let keys = self.inner.read().keys();
        keys.into_iter()
            .filter_map(|key| self.get(&key).ok().map(|value| (key, value)))
            .collect()
    }

    fn keys(&self) -> Vec<K> {
        let keys = self.inner.read().keys();
        keys.into_iter().filter(|key| self.get(key).is_ok()).collect()
    }

    fn clear(&self) {
        let mut core = self.inner.write();
        core.clear();
        self.stats.reset_key_count();
    }

    fn contains(&self, key: &K) -> bool {
        let now = self.clock.now();
        matches!(self.inner.read().peek_with(key, now, |_| ()), Lookup::Hit(()))
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn policy(&self) -> CachePolicy {
        CachePolicy::Simple
    }
}

impl<K, V> StatsAccessor for SimpleCache<K, V> {
    fn counters(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K, V> fmt::Display for SimpleCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SimpleCache:[size:{}, count:{}]",
            self.capacity,
            self.inner.read().len()
        )
    }
}

impl<K, V> fmt::Debug for SimpleCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleCache")
            .field("capacity", &self.capacity)
            .field("len", &self.inner.read().len())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
