//! Eviction policies.
//!
//! | Policy                | Evicts                          | Lookup cost |
//! |-----------------------|---------------------------------|-------------|
//! | [`SimpleCache`]       | an expired entry, else any      | O(1)        |
//! | [`LruCache`]          | least recently used             | O(1)        |
//! | [`LfuCache`]          | least frequently used           | O(1) amort. |
//!
//! Each policy splits into a single-threaded core that owns the store and
//! its bookkeeping, and a public wrapper that adds the `parking_lot::RwLock`,
//! the injected clock and the statistics counters.

pub mod lfu;
pub mod lru;
pub mod simple;

pub use lfu::LfuCache;
pub use lru::LruCache;
pub use simple::SimpleCache;

use crate::builder::CachePolicy;
use crate::error::CacheError;
use crate::stats::CacheStats;

/// Result of looking up a key inside a policy core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup<T> {
    Hit(T),
    Absent,
    /// The entry had expired. Mutating lookups have already removed it.
    Expired,
}

impl<T> Lookup<T> {
    /// Records the outcome in `stats` and converts it to the public result.
    ///
    /// Only call for lookups that removed the expired entry, since
    /// `Expired` decrements the key count.
    pub(crate) fn settle(self, stats: &CacheStats, policy: CachePolicy) -> Result<T, CacheError> {
        match self {
            Lookup::Hit(value) => {
                stats.record_lookup(true);
                Ok(value)
            },
            Lookup::Absent => {
                stats.record_lookup(false);
                Err(CacheError::NotFound)
            },
            Lookup::Expired => {
                stats.record_lookup(false);
                stats.decr_key_count();
                tracing::trace!(%policy, "removed expired entry on lookup");
                Err(CacheError::NotFound)
            },
        }
    }
}

/// Outcome of an insert into a policy core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inserted<K> {
    /// An existing entry was overwritten in place.
    Updated,
    /// A new entry was added; `evicted` names the key removed to make room.
    Added { evicted: Option<K> },
}

impl<K> Inserted<K> {
    /// Applies the key/eviction counter changes for this insert.
    pub(crate) fn record(&self, stats: &CacheStats, policy: CachePolicy, capacity: usize) {
        if let Inserted::Added { evicted } = self {
            if evicted.is_some() {
                stats.incr_evict_count();
                stats.decr_key_count();
                tracing::debug!(%policy, capacity, "evicted entry at capacity");
            }
            stats.incr_key_count();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsAccessor;

    #[test]
    fn settle_hit_counts_hit() {
        let stats = CacheStats::new();
        assert_eq!(Lookup::Hit(7).settle(&stats, CachePolicy::Lru), Ok(7));
        assert_eq!(stats.hit_count(), 1);
        assert_eq!(stats.miss_count(), 0);
    }

    #[test]
    fn settle_expired_counts_miss_and_drops_key() {
        let stats = CacheStats::new();
        stats.incr_key_count();
        let result: Result<(), _> = Lookup::Expired.settle(&stats, CachePolicy::Simple);
        assert_eq!(result, Err(CacheError::NotFound));
        assert_eq!(stats.miss_count(), 1);
        assert_eq!(stats.key_count(), 0);
    }

    #[test]
    fn settle_absent_keeps_key_count() {
        let stats = CacheStats::new();
        stats.incr_key_count();
        let result: Result<(), _> = Lookup::Absent.settle(&stats, CachePolicy::Lfu);
        assert!(result.is_err());
        assert_eq!(stats.key_count(), 1);
    }

    #[test]
    fn inserted_record_with_eviction() {
        let stats = CacheStats::new();
        Inserted::<u8>::Added { evicted: None }.record(&stats, CachePolicy::Lru, 1);
        Inserted::Added { evicted: Some(1u8) }.record(&stats, CachePolicy::Lru, 1);
        Inserted::<u8>::Updated.record(&stats, CachePolicy::Lru, 1);
        assert_eq!(stats.key_count(), 1);
        assert_eq!(stats.evict_count(), 1);
    }
}
