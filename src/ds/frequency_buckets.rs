//! Frequency-bucket chain for O(1) LFU bookkeeping.
//!
//! ## Architecture
//!
//! ```text
//!   buckets: SlotArena<Bucket<M>>
//!
//!   sentinel                                   (strictly increasing freq)
//!   ┌──────────┐     ┌──────────┐     ┌──────────┐
//!   │ freq = 0 │ ◄─► │ freq = 1 │ ◄─► │ freq = 4 │
//!   │ {e3, e7} │     │ {e1}     │     │ {e2, e5} │
//!   └──────────┘     └──────────┘     └──────────┘
//!        ▲
//!        └── every new member joins here; this bucket is never discarded
//! ```
//!
//! Each bucket owns the set of members that share its access count. The
//! caller keeps the [`BucketId`] returned for a member as the member's back
//! reference and hands it back on [`increment`](FrequencyBuckets::increment)
//! and [`remove`](FrequencyBuckets::remove); the chain itself stores no
//! member → bucket index.
//!
//! ## Increment
//!
//! ```text
//!   increment(e1, freq=1 bucket):
//!     1. take e1 out of {e1}
//!     2. successor has freq 4, not 2 → splice a freq=2 bucket after freq=1
//!     3. put e1 into freq=2
//!     4. freq=1 is now empty and not the sentinel → unlink it
//!
//!   freq=0 {e3, e7} ◄─► freq=2 {e1} ◄─► freq=4 {e2, e5}
//! ```
//!
//! Only the current bucket and its immediate successor are touched, so an
//! increment is O(1) amortized.
//!
//! ## Eviction
//!
//! [`pop_lowest`](FrequencyBuckets::pop_lowest) walks from the sentinel
//! upward and takes an arbitrary member (set iteration order) of the first
//! non-empty bucket. Because empty non-sentinel buckets are unlinked eagerly,
//! at most the sentinel is skipped.
//!
//! ## Invariants
//!
//! - the sentinel (freq 0) is always the head of the chain
//! - frequencies strictly increase along the chain
//! - no bucket other than the sentinel is empty
//! - a member belongs to at most one bucket
//!
//! `debug_validate_invariants()` checks all of the above in debug/test builds.

use std::hash::Hash;

use rustc_hash::FxHashSet;

use crate::ds::slot_arena::{SlotArena, SlotId};

/// Handle to a bucket in a [`FrequencyBuckets`] chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketId(SlotId);

#[derive(Debug)]
struct Bucket<M> {
    freq: u64,
    members: FxHashSet<M>,
    prev: Option<BucketId>,
    next: Option<BucketId>,
}

impl<M> Bucket<M> {
    fn new(freq: u64, prev: Option<BucketId>, next: Option<BucketId>) -> Self {
        Self {
            freq,
            members: FxHashSet::default(),
            prev,
            next,
        }
    }
}

/// Doubly linked chain of frequency buckets headed by a permanent freq-0 sentinel.
#[derive(Debug)]
pub struct FrequencyBuckets<M> {
    buckets: SlotArena<Bucket<M>>,
    sentinel: BucketId,
    members: usize,
}

impl<M> FrequencyBuckets<M>
where
    M: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        let mut buckets = SlotArena::new();
        let sentinel = BucketId(buckets.insert(Bucket::new(0, None, None)));
        Self {
            buckets,
            sentinel,
            members: 0,
        }
    }

    /// The freq-0 bucket every new member joins.
    #[inline]
    pub fn sentinel(&self) -> BucketId {
        self.sentinel
    }

    /// Number of tracked members across all buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.members
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members == 0
    }

    /// Number of buckets in the chain, sentinel included.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Access count shared by the members of `bucket`.
    pub fn frequency(&self, bucket: BucketId) -> Option<u64> {
        self.buckets.get(bucket.0).map(|b| b.freq)
    }

    pub fn contains(&self, member: &M, bucket: BucketId) -> bool {
        self.buckets
            .get(bucket.0)
            .is_some_and(|b| b.members.contains(member))
    }

    /// Adds `member` to the sentinel bucket and returns it.
    pub fn insert(&mut self, member: M) -> BucketId {
        let sentinel = self.sentinel;
        if let Some(bucket) = self.buckets.get_mut(sentinel.0)
            && bucket.members.insert(member)
        {
            self.members += 1;
        }
        sentinel
    }

    /// Moves `member` from `current` into the bucket for `current.freq + 1`.
    ///
    /// Returns the member's new bucket, or `None` if `member` is not in
    /// `current` (the chain is left untouched in that case).
    pub fn increment(&mut self, member: M, current: BucketId) -> Option<BucketId> {
        let (freq, successor) = {
            let bucket = self.buckets.get_mut(current.0)?;
            if bucket.freq == u64::MAX {
                return bucket.members.contains(&member).then_some(current);
            }
            if !bucket.members.remove(&member) {
                return None;
            }
            (bucket.freq, bucket.next)
        };
        let wanted = freq + 1;

        let target = match successor {
            Some(next) if self.frequency(next) == Some(wanted) => next,
            _ => self.splice_after(current, wanted),
        };
        if let Some(bucket) = self.buckets.get_mut(target.0) {
            bucket.members.insert(member);
        }
        self.discard_if_empty(current);
        Some(target)
    }

    /// Removes `member` from `bucket`, unlinking the bucket if it empties.
    pub fn remove(&mut self, member: &M, bucket: BucketId) -> bool {
        let removed = self
            .buckets
            .get_mut(bucket.0)
            .is_some_and(|b| b.members.remove(member));
        if removed {
            self.members -= 1;
            self.discard_if_empty(bucket);
        }
        removed
    }

    /// Removes and returns a member of the lowest-frequency non-empty bucket.
    pub fn pop_lowest(&mut self) -> Option<(M, u64)> {
        let mut cursor = Some(self.sentinel);
        while let Some(id) = cursor {
            let bucket = self.buckets.get_mut(id.0)?;
            if let Some(member) = bucket.members.iter().next().copied() {
                bucket.members.remove(&member);
                let freq = bucket.freq;
                self.members -= 1;
                self.discard_if_empty(id);
                return Some((member, freq));
            }
            cursor = bucket.next;
        }
        None
    }

    /// `(freq, member count)` for every bucket, lowest first.
    pub fn histogram(&self) -> Vec<(u64, usize)> {
        self.iter_buckets()
            .map(|bucket| (bucket.freq, bucket.members.len()))
            .collect()
    }

    /// Drops every member and bucket, leaving a fresh sentinel.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.sentinel = BucketId(self.buckets.insert(Bucket::new(0, None, None)));
        self.members = 0;
    }

    fn iter_buckets(&self) -> impl Iterator<Item = &Bucket<M>> + '_ {
        let mut cursor = Some(self.sentinel);
        std::iter::from_fn(move || {
            let bucket = self.buckets.get(cursor?.0)?;
            cursor = bucket.next;
            Some(bucket)
        })
    }

    fn splice_after(&mut self, at: BucketId, freq: u64) -> BucketId {
        let next = self.buckets.get(at.0).and_then(|b| b.next);
        let id = BucketId(self.buckets.insert(Bucket::new(freq, Some(at), next)));
        if let Some(bucket) = self.buckets.get_mut(at.0) {
            bucket.next = Some(id);
        }
        if let Some(bucket) = next.and_then(|n| self.buckets.get_mut(n.0)) {
            bucket.prev = Some(id);
        }
        id
    }

    fn discard_if_empty(&mut self, id: BucketId) {
        if id == self.sentinel {
            return;
        }
        let (prev, next) = match self.buckets.get(id.0) {
            Some(bucket) if bucket.members.is_empty() => (bucket.prev, bucket.next),
            _ => return,
        };
        if let Some(bucket) = prev.and_then(|p| self.buckets.get_mut(p.0)) {
            bucket.next = next;
        }
        if let Some(bucket) = next.and_then(|n| self.buckets.get_mut(n.0)) {
            bucket.prev = prev;
        }
        self.buckets.remove(id.0);
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let head = self
            .buckets
            .get(self.sentinel.0)
            .expect("sentinel bucket missing");
        assert_eq!(head.freq, 0, "sentinel must hold frequency 0");
        assert!(head.prev.is_none(), "sentinel must head the chain");

        let mut seen = FxHashSet::default();
        let mut walked = 0usize;
        let mut members = 0usize;
        let mut last_freq = None;
        let mut prev = None;
        let mut cursor = Some(self.sentinel);
        while let Some(id) = cursor {
            let bucket = self.buckets.get(id.0).expect("dangling bucket link");
            assert_eq!(bucket.prev, prev, "bucket back link mismatch");
            if let Some(last) = last_freq {
                assert!(bucket.freq > last, "bucket frequencies not increasing");
            }
            if id != self.sentinel {
                assert!(!bucket.members.is_empty(), "empty non-sentinel bucket");
            }
            for member in &bucket.members {
                assert!(seen.insert(*member), "member in two buckets");
            }
            members += bucket.members.len();
            walked += 1;
            assert!(walked <= self.buckets.len(), "cycle in bucket chain");
            last_freq = Some(bucket.freq);
            prev = Some(id);
            cursor = bucket.next;
        }
        assert_eq!(walked, self.buckets.len(), "unlinked bucket left in arena");
        assert_eq!(members, self.members, "member count drift");
    }
}

impl<M> Default for FrequencyBuckets<M>
where
    M: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chain_has_only_empty_sentinel() {
        let chain: FrequencyBuckets<u32> = FrequencyBuckets::new();
        assert_eq!(chain.bucket_count(), 1);
        assert_eq!(chain.frequency(chain.sentinel()), Some(0));
        assert!(chain.is_empty());
        chain.debug_validate_invariants();
    }

    #[test]
    fn insert_joins_sentinel() {
        let mut chain = FrequencyBuckets::new();
        let a = chain.insert(1u32);
        let b = chain.insert(2u32);
        assert_eq!(a, chain.sentinel());
        assert_eq!(b, chain.sentinel());
        assert_eq!(chain.histogram(), vec![(0, 2)]);
        chain.debug_validate_invariants();
    }

    #[test]
    fn increment_splices_and_reuses_successor() {
        let mut chain = FrequencyBuckets::new();
        let a = chain.insert(1u32);
        let b = chain.insert(2u32);

        let a1 = chain.increment(1, a).unwrap();
        assert_eq!(chain.frequency(a1), Some(1));
        assert_eq!(chain.histogram(), vec![(0, 1), (1, 1)]);

        let b1 = chain.increment(2, b).unwrap();
        assert_eq!(b1, a1, "existing freq=1 bucket must be reused");
        assert_eq!(chain.histogram(), vec![(0, 0), (1, 2)]);
        chain.debug_validate_invariants();
    }

    #[test]
    fn sentinel_survives_when_empty() {
        let mut chain = FrequencyBuckets::new();
        let s = chain.insert(9u32);
        chain.increment(9, s).unwrap();
        assert_eq!(chain.bucket_count(), 2);
        assert_eq!(chain.histogram()[0], (0, 0));
        chain.debug_validate_invariants();
    }

    #[test]
    fn emptied_bucket_is_unlinked() {
        let mut chain = FrequencyBuckets::new();
        let mut at = chain.insert(1u32);
        at = chain.increment(1, at).unwrap();
        at = chain.increment(1, at).unwrap();
        at = chain.increment(1, at).unwrap();
        assert_eq!(chain.frequency(at), Some(3));
        // only the sentinel and freq=3 remain
        assert_eq!(chain.histogram(), vec![(0, 0), (3, 1)]);
        chain.debug_validate_invariants();
    }

    #[test]
    fn increment_inserts_between_non_adjacent_frequencies() {
        let mut chain = FrequencyBuckets::new();
        let mut hot = chain.insert(1u32);
        for _ in 0..3 {
            hot = chain.increment(1, hot).unwrap();
        }
        let cold = chain.insert(2u32);
        let warm = chain.increment(2, cold).unwrap();

        assert_eq!(chain.frequency(warm), Some(1));
        assert_eq!(chain.frequency(hot), Some(3));
        assert_eq!(chain.histogram(), vec![(0, 0), (1, 1), (3, 1)]);
        chain.debug_validate_invariants();
    }

    #[test]
    fn increment_with_wrong_bucket_is_rejected() {
        let mut chain = FrequencyBuckets::new();
        let s = chain.insert(1u32);
        let one = chain.increment(1, s).unwrap();
        assert_eq!(chain.increment(1, s), None);
        assert!(chain.contains(&1, one));
        chain.debug_validate_invariants();
    }

    #[test]
    fn remove_unlinks_empty_bucket() {
        let mut chain = FrequencyBuckets::new();
        let s = chain.insert(1u32);
        let one = chain.increment(1, s).unwrap();
        assert!(chain.remove(&1, one));
        assert!(!chain.remove(&1, one));
        assert_eq!(chain.bucket_count(), 1);
        assert!(chain.is_empty());
        chain.debug_validate_invariants();
    }

    #[test]
    fn pop_lowest_prefers_lowest_frequency() {
        let mut chain = FrequencyBuckets::new();
        let mut a = chain.insert('a');
        for _ in 0..3 {
            a = chain.increment('a', a).unwrap();
        }
        let b = chain.insert('b');
        chain.increment('b', b).unwrap();
        chain.insert('c');

        assert_eq!(chain.pop_lowest(), Some(('c', 0)));
        assert_eq!(chain.pop_lowest(), Some(('b', 1)));
        assert_eq!(chain.pop_lowest(), Some(('a', 3)));
        assert_eq!(chain.pop_lowest(), None);
        assert_eq!(chain.bucket_count(), 1);
        chain.debug_validate_invariants();
    }

    #[test]
    fn clear_restores_fresh_sentinel() {
        let mut chain = FrequencyBuckets::new();
        let s = chain.insert(1u32);
        chain.increment(1, s);
        chain.insert(2u32);
        chain.clear();
        assert!(chain.is_empty());
        assert_eq!(chain.bucket_count(), 1);
        assert_eq!(chain.frequency(chain.sentinel()), Some(0));
        chain.debug_validate_invariants();
    }
}
