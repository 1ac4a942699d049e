//! # Least Frequently Used (LFU) cache, O(1)
//!
//! Entries live in a [`SlotArena`]; their access counts are tracked by a
//! [`FrequencyBuckets`] chain keyed by the entry's [`SlotId`]. Each entry
//! keeps the [`BucketId`] of the bucket that currently owns it, so a hit is a
//! constant-time move to the neighbouring bucket and eviction takes any
//! member of the lowest non-empty bucket.
//!
//! ## Architecture
//!
//! ```text
//!   LfuCache<K, V>
//!   ┌─────────────────────────────────────────────────────────────────────┐
//!   │ RwLock<LfuCore<K, V>>                                               │
//!   │                                                                     │
//!   │   index: FxHashMap<K, SlotId>                                       │
//!   │        │                                                            │
//!   │        ▼                                                            │
//!   │   entries: SlotArena<LfuEntry>     LfuEntry { key, CacheEntry,      │
//!   │        │                                      bucket: BucketId }    │
//!   │        │ SlotId members                             │               │
//!   │        ▼                                            ▼               │
//!   │   buckets: FrequencyBuckets<SlotId>                                 │
//!   │     [freq 0 {s3}] ◄─► [freq 1 {s0, s4}] ◄─► [freq 5 {s1}]           │
//!   │       sentinel                                                      │
//!   ├─────────────────────────────────────────────────────────────────────┤
//!   │ Arc<dyn Clock>                                CacheStats            │
//!   └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Access Counting
//!
//! | Operation          | Frequency effect                          |
//! |--------------------|-------------------------------------------|
//! | `set` (new key)    | joins the freq-0 sentinel bucket          |
//! | `set` (existing)   | unchanged                                 |
//! | `get`/`ttl` hit    | +1                                        |
//! | `expire` hit       | +1 (the lookup counts as an access)       |
//! | lookup of expired  | entry removed, never incremented          |
//! | `contains`         | unchanged                                 |
//!
//! Ties inside a bucket are broken by set iteration order, which is not
//! specified.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::builder::CachePolicy;
use crate::clock::{Clock, Timestamp};
use crate::ds::{BucketId, FrequencyBuckets, SlotArena, SlotId};
use crate::entry::{CacheEntry, Ttl};
use crate::error::{CacheError, ConfigError};
use crate::policy::{Inserted, Lookup};
use crate::stats::{CacheStats, StatsAccessor};
use crate::traits::CoreCache;

#[derive(Debug)]
struct LfuEntry<K, V> {
    key: K,
    entry: CacheEntry<V>,
    bucket: BucketId,
}

/// Single-threaded LFU store.
#[derive(Debug)]
pub(crate) struct LfuCore<K, V> {
    index: FxHashMap<K, SlotId>,
    entries: SlotArena<LfuEntry<K, V>>,
    buckets: FrequencyBuckets<SlotId>,
    capacity: usize,
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::default(),
            entries: SlotArena::new(),
            buckets: FrequencyBuckets::new(),
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Looks `key` up, counting an access on a live entry and dropping an
    /// expired one.
    pub(crate) fn lookup_with<T>(
        &mut self,
        key: &K,
        now: Timestamp,
        f: impl FnOnce(&mut CacheEntry<V>) -> T,
    ) -> Lookup<T> {
        let Some(&id) = self.index.get(key) else {
            return Lookup::Absent;
        };
        let (expired, bucket) = match self.entries.get(id) {
            Some(slot) => (slot.entry.is_expired(now), slot.bucket),
            None => return Lookup::Absent,
        };
        if expired {
            self.remove(key);
            return Lookup::Expired;
        }

        let promoted = self.buckets.increment(id, bucket);
        match self.entries.get_mut(id) {
            Some(slot) => {
                if let Some(next) = promoted {
                    slot.bucket = next;
                }
                Lookup::Hit(f(&mut slot.entry))
            },
            None => Lookup::Absent,
        }
    }

    /// Reads a live entry without counting an access.
    fn peek_with<T>(
        &self,
        key: &K,
        now: Timestamp,
        f: impl FnOnce(&LfuEntry<K, V>) -> T,
    ) -> Lookup<T> {
        let slot = self.index.get(key).and_then(|&id| self.entries.get(id));
        match slot {
            None => Lookup::Absent,
            Some(slot) if slot.entry.is_expired(now) => Lookup::Expired,
            Some(slot) => Lookup::Hit(f(slot)),
        }
    }

    pub(crate) fn insert(&mut self, key: K, value: V, expire_at: Timestamp) -> Inserted<K> {
        if let Some(slot) = self
            .index
            .get(&key)
            .and_then(|&id| self.entries.get_mut(id))
        {
            slot.entry.overwrite(value, expire_at);
            return Inserted::Updated;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict(1).pop()
        } else {
            None
        };
        let id = self.entries.insert(LfuEntry {
            key: key.clone(),
            entry: CacheEntry::new(value, expire_at),
            bucket: self.buckets.sentinel(),
        });
        let bucket = self.buckets.insert(id);
        if let Some(slot) = self.entries.get_mut(id) {
            slot.bucket = bucket;
        }
        self.index.insert(key, id);
        Inserted::Added { evicted }
    }

    /// Removes up to `count` entries, lowest frequency first.
    pub(crate) fn evict(&mut self, count: usize) -> Vec<K> {
        let mut evicted = Vec::with_capacity(count);
        while evicted.len() < count {
            let Some((id, _freq)) = self.buckets.pop_lowest() else {
                break;
            };
            if let Some(slot) = self.entries.remove(id) {
                self.index.remove(&slot.key);
                evicted.push(slot.key);
            }
        }
        evicted
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let id = self.index.remove(key)?;
        let slot = self.entries.remove(id)?;
        self.buckets.remove(&id, slot.bucket);
        Some(slot.entry)
    }

    pub(crate) fn frequency(&self, key: &K, now: Timestamp) -> Option<u64> {
        match self.peek_with(key, now, |slot| slot.bucket) {
            Lookup::Hit(bucket) => self.buckets.frequency(bucket),
            _ => None,
        }
    }

    pub(crate) fn keys(&self) -> Vec<K> {
        self.index.keys().cloned().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
        self.buckets.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate_invariants(&self) {
        self.buckets.debug_validate_invariants();
        assert_eq!(self.index.len(), self.entries.len(), "index/arena drift");
        assert_eq!(self.index.len(), self.buckets.len(), "index/bucket drift");
        assert!(self.index.len() <= self.capacity, "capacity exceeded");
        for (key, &id) in &self.index {
            let slot = self.entries.get(id).expect("index points at a freed slot");
            assert!(slot.key == *key, "index handle points at another key");
            assert!(
                self.buckets.contains(&id, slot.bucket),
                "entry missing from its bucket"
            );
        }
    }
}

/// Thread-safe LFU cache with per-entry expiration.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use evictcache::clock::SystemClock;
/// use evictcache::policy::lfu::LfuCache;
/// use evictcache::traits::CoreCache;
///
/// let cache = LfuCache::try_new(3, Arc::new(SystemClock)).unwrap();
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.set("c", 3);
/// for _ in 0..3 {
///     let _ = cache.get(&"a");
/// }
/// let _ = cache.get(&"b");
///
/// cache.set("d", 4); // "c" has never been read
/// assert!(!cache.contains(&"c"));
/// assert_eq!(cache.frequency(&"a"), Some(3));
/// assert_eq!(cache.frequency(&"d"), Some(0));
/// ```
pub struct LfuCache<K, V> {
    inner: RwLock<LfuCore<K, V>>,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
    capacity: usize,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an LFU cache holding at most `capacity` entries.
    ///
    /// Returns a [`ConfigError`] when `capacity` is zero.
    pub fn try_new(capacity: usize, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::new("lfu capacity must be greater than zero"));
        }
        Ok(Self {
            inner: RwLock::new(LfuCore::new(capacity)),
            clock,
            stats: CacheStats::new(),
            capacity,
        })
    }

    /// Access count of a live `key`. Does not count as an access.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        let now = self.clock.now();
        self.inner.read().frequency(key, now)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let core = self.inner.read();
        core.debug_validate_invariants();
        assert_eq!(core.len() as u64, self.stats.key_count(), "key counter drift");
    }
}

impl<K, V> CoreCache<K, V> for LfuCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Result<V, CacheError> {
        let now = self.clock.now();
        let mut core = self.inner.write();
        core.lookup_with(key, now, |entry| entry.value.clone())
            .settle(&self.stats, CachePolicy::Lfu)
    }

    fn set_with_expire(&self, key: K, value: V, ttl_secs: i64) {
        let expire_at = self.clock.expire_at(ttl_secs);
        let mut core = self.inner.write();
        core.insert(key, value, expire_at)
            .record(&self.stats, CachePolicy::Lfu, self.capacity);
    }

    fn expire(&self, key: &K, ttl_secs: i64) -> Result<(), CacheError> {
        let now = self.clock.now();
        let expire_at = self.clock.expire_at(ttl_secs);
        let mut core = self.inner.write();
        core.lookup_with(key, now, |entry| entry.expire_at = expire_at)
            .settle(&self.stats, CachePolicy::Lfu)
    }

    fn ttl(&self, key: &K) -> Result<Ttl, CacheError> {
        let now = self.clock.now();
        let mut core = self.inner.write();
        core.lookup_with(key, now, |entry| entry.ttl(now))
            .settle(&self.stats, CachePolicy::Lfu)
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
        CachePolicy::Lfu
    }
}

impl<K, V> StatsAccessor for LfuCache<K, V> {
    fn counters(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K, V> fmt::Display for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LfuCache:[size:{}, count:{}]",
            self.capacity,
            self.inner.read().len()
        )
    }
}

impl<K, V> fmt::Debug for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.read();
        f.debug_struct("LfuCache")
            .field("capacity", &self.capacity)
            .field("len", &core.len())
            .field("frequencies", &core.buckets.histogram())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
