//! Hit/miss/eviction statistics shared by every policy.
//!
//! Counters are independent `AtomicU64`s updated with relaxed ordering,
//! outside the cache lock. They are advisory: under concurrent bursts a
//! reader may briefly see a key count that disagrees with the store.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters owned by a single cache instance.
#[derive(Debug, Default)]
pub struct CacheStats {
    keys: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn incr_key_count(&self) -> u64 {
        self.keys.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Only called after a matching `incr_key_count`.
    #[inline]
    pub(crate) fn decr_key_count(&self) -> u64 {
        self.keys.fetch_sub(1, Ordering::Relaxed).wrapping_sub(1)
    }

    #[inline]
    pub(crate) fn reset_key_count(&self) {
        self.keys.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn incr_hit_count(&self) -> u64 {
        self.hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub(crate) fn incr_miss_count(&self) -> u64 {
        self.misses.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub(crate) fn incr_evict_count(&self) -> u64 {
        self.evictions.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Records the outcome of a lookup.
    #[inline]
    pub(crate) fn record_lookup(&self, hit: bool) {
        if hit {
            self.incr_hit_count();
        } else {
            self.incr_miss_count();
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            key_count: self.keys.load(Ordering::Relaxed),
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            evict_count: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a cache's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub key_count: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub evict_count: u64,
}

impl StatsSnapshot {
    pub fn lookup_count(&self) -> u64 {
        self.hit_count + self.miss_count
    }

    /// `hits / (hits + misses)`, or `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookup_count() {
            0 => 0.0,
            total => self.hit_count as f64 / total as f64,
        }
    }
}

/// Read access to a cache's statistics.
///
/// Implementors only provide [`counters`](StatsAccessor::counters); every
/// policy therefore reports statistics identically.
pub trait StatsAccessor {
    fn counters(&self) -> &CacheStats;

    fn key_count(&self) -> u64 {
        self.counters().keys.load(Ordering::Relaxed)
    }

    fn hit_count(&self) -> u64 {
        self.counters().hits.load(Ordering::Relaxed)
    }

    fn miss_count(&self) -> u64 {
        self.counters().misses.load(Ordering::Relaxed)
    }

    /// `hit_count() + miss_count()`.
    fn lookup_count(&self) -> u64 {
        self.hit_count() + self.miss_count()
    }

    fn evict_count(&self) -> u64 {
        self.counters().evictions.load(Ordering::Relaxed)
    }

    /// Fraction of lookups that hit, `0.0` when nothing was looked up yet.
    fn hit_rate(&self) -> f64 {
        let (hits, misses) = (self.hit_count(), self.miss_count());
        match hits + misses {
            0 => 0.0,
            total => hits as f64 / total as f64,
        }
    }

    fn stats(&self) -> StatsSnapshot {
        self.counters().snapshot()
    }
}

impl StatsAccessor for CacheStats {
    fn counters(&self) -> &CacheStats {
        self
    }
}
