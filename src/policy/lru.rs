//! # Least Recently Used (LRU) cache
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                          LruCache<K, V>                              │
//!   │                                                                      │
//!   │   ┌──────────────────────────────────────────────────────────────┐   │
//!   │   │                    RwLock<LruCore<K, V>>                     │   │
//!   │   │                                                              │   │
//!   │   │   FxHashMap<K, SlotId>                                       │   │
//!   │   │   ┌────────┬──────────┐                                      │   │
//!   │   │   │ "a"    │ id_2  ───┼──────────────┐                       │   │
//!   │   │   │ "b"    │ id_0  ───┼───────┐      │                       │   │
//!   │   │   └────────┴──────────┘       ▼      ▼                       │   │
//!   │   │                                                              │   │
//!   │   │   IntrusiveList<LruNode>  head ─► [b] ◄──► [a] ◄── tail      │   │
//!   │   │                           (MRU)              (LRU)           │   │
//!   │   │   each node: key + CacheEntry { value, expire_at }           │   │
//!   │   └──────────────────────────────────────────────────────────────┘   │
//!   │                                                                      │
//!   │   Arc<dyn Clock>                         CacheStats (atomics)        │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation          | List effect                          | Lock      |
//! |--------------------|--------------------------------------|-----------|
//! | `set` (new key)    | evict tail if full, push at head     | exclusive |
//! | `set` (existing)   | overwrite in place, move to head     | exclusive |
//! | `get`/`ttl` hit    | move to head                         | exclusive |
//! | lookup of expired  | unlink and drop                      | exclusive |
//! | `del`              | unlink and drop                      | exclusive |
//! | `contains`         | none                                 | shared    |
//! | `recency_rank`     | none (O(n) walk)                     | shared    |
//!
//! Lookups take the exclusive lock because a hit reorders the list.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use evictcache::clock::SystemClock;
//! use evictcache::policy::lru::LruCache;
//! use evictcache::traits::CoreCache;
//!
//! let cache = LruCache::try_new(2, Arc::new(SystemClock)).unwrap();
//! cache.set("a", 1);
//! cache.set("b", 2);
//! let _ = cache.get(&"a"); // "a" becomes most recently used
//! cache.set("c", 3); // evicts "b"
//!
//! assert!(cache.contains(&"a"));
//! assert!(!cache.contains(&"b"));
//! assert_eq!(cache.recency_rank(&"c"), Some(0));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::builder::CachePolicy;
use crate::clock::{Clock, Timestamp};
use crate::ds::{IntrusiveList, SlotId};
use crate::entry::{CacheEntry, Ttl};
use crate::error::{CacheError, ConfigError};
use crate::policy::{Inserted, Lookup};
use crate::stats::{CacheStats, StatsAccessor};
use crate::traits::CoreCache;

#[derive(Debug)]
struct LruNode<K, V> {
    key: K,
    entry: CacheEntry<V>,
}

/// Single-threaded LRU store: key index plus recency list.
#[derive(Debug)]
pub(crate) struct LruCore<K, V> {
    index: FxHashMap<K, SlotId>,
    list: IntrusiveList<LruNode<K, V>>,
    capacity: usize,
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::default(),
            list: IntrusiveList::new(),
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Looks `key` up, promoting a live entry and dropping an expired one.
    pub(crate) fn lookup_with<T>(
        &mut self,
        key: &K,
        now: Timestamp,
        f: impl FnOnce(&mut CacheEntry<V>) -> T,
    ) -> Lookup<T> {
        let Some(&id) = self.index.get(key) else {
            return Lookup::Absent;
        };
        let expired = match self.list.get(id) {
            Some(node) => node.entry.is_expired(now),
            None => return Lookup::Absent,
        };
        if expired {
            self.index.remove(key);
            self.list.remove(id);
            return Lookup::Expired;
        }

        self.list.move_to_front(id);
        match self.list.get_mut(id) {
            Some(node) => Lookup::Hit(f(&mut node.entry)),
            None => Lookup::Absent,
        }
    }

    /// Reads a live entry without touching recency.
    pub(crate) fn peek_with<T>(
        &self,
        key: &K,
        now: Timestamp,
        f: impl FnOnce(&CacheEntry<V>) -> T,
    ) -> Lookup<T> {
        let node = self.index.get(key).and_then(|&id| self.list.get(id));
        match node {
            None => Lookup::Absent,
            Some(node) if node.entry.is_expired(now) => Lookup::Expired,
            Some(node) => Lookup::Hit(f(&node.entry)),
        }
    }

    pub(crate) fn insert(&mut self, key: K, value: V, expire_at: Timestamp) -> Inserted<K> {
        if let Some(&id) = self.index.get(&key) {
            if let Some(node) = self.list.get_mut(id) {
                node.entry.overwrite(value, expire_at);
                self.list.move_to_front(id);
                return Inserted::Updated;
            }
            self.index.remove(&key);
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };
        let id = self.list.push_front(LruNode {
            key: key.clone(),
            entry: CacheEntry::new(value, expire_at),
        });
        self.index.insert(key, id);
        Inserted::Added { evicted }
    }

    /// Drops the tail entry. An empty list is a no-op.
    fn evict_lru(&mut self) -> Option<K> {
        let node = self.list.pop_back()?;
        self.index.remove(&node.key);
        Some(node.key)
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let id = self.index.remove(key)?;
        self.list.remove(id).map(|node| node.entry)
    }

    /// Keys from most to least recently used.
    pub(crate) fn keys(&self) -> Vec<K> {
        self.list.iter().map(|node| node.key.clone()).collect()
    }

    pub(crate) fn recency_rank(&self, key: &K) -> Option<usize> {
        let &id = self.index.get(key)?;
        self.list.position(id)
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.list.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants();
        assert_eq!(self.index.len(), self.list.len(), "index/list length drift");
        assert!(self.index.len() <= self.capacity, "capacity exceeded");
        for (key, &id) in &self.index {
            let node = self.list.get(id).expect("index points at a freed node");
            assert!(node.key == *key, "index handle points at another key");
        }
    }
}

/// Thread-safe LRU cache with per-entry expiration.
pub struct LruCache<K, V> {
    inner: RwLock<LruCore<K, V>>,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an LRU cache holding at most `capacity` entries.
    ///
    /// Returns a [`ConfigError`] when `capacity` is zero.
    pub fn try_new(capacity: usize, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::new("lru capacity must be greater than zero"));
        }
        Ok(Self {
            inner: RwLock::new(LruCore::new(capacity)),
            clock,
            stats: CacheStats::new(),
            capacity,
        })
    }

    /// Position of a live `key` in recency order, `0` being the most
    /// recently used. Does not promote or count.
    pub fn recency_rank(&self, key: &K) -> Option<usize> {
        let now = self.clock.now();
        let core = self.inner.read();
        match core.peek_with(key, now, |_| ()) {
            Lookup::Hit(()) => core.recency_rank(key),
            _ => None,
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let core = self.inner.read();
        core.debug_validate_invariants();
        assert_eq!(
            core.len() as u64,
            self.stats.key_count(),
            "key counter drift"
        );
    }
}

impl<K, V> CoreCache<K, V> for LruCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Result<V, CacheError> {
        let now = self.clock.now();
        let mut core = self.inner.write();
        core.lookup_with(key, now, |entry| entry.value.clone())
            .settle(&self.stats, CachePolicy::Lru)
    }

    fn set_with_expire(&self, key: K, value: V, ttl_secs: i64) {
        let expire_at = self.clock.expire_at(ttl_secs);
        let mut core = self.inner.write();
        core.insert(key, value, expire_at)
            .record(&self.stats, CachePolicy::Lru, self.capacity);
    }

    fn expire(&self, key: &K, ttl_secs: i64) -> Result<(), CacheError> {
        let now = self.clock.now();
        let expire_at = self.clock.expire_at(ttl_secs);
        let mut core = self.inner.write();
        core.lookup_with(key, now, |entry| entry.expire_at = expire_at)
            .settle(&self.stats, CachePolicy::Lru)
    }

    fn ttl(&self, key: &K) -> Result<Ttl, CacheError> {
        let now = self.clock.now();
        let mut core = self.inner.write();
        core.lookup_with(key, now, |entry| entry.ttl(now))
            .settle(&self.stats, CachePolicy::Lru)
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
        CachePolicy::Lru
    }
}

impl<K, V> StatsAccessor for LruCache<K, V> {
    fn counters(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K, V> fmt::Display for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LruCache:[size:{}, count:{}]",
            self.capacity,
            self.inner.read().len()
        )
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.inner.read().len())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
