//! Stored value plus its absolute expiration.
//!
//! Every policy keeps a [`CacheEntry`] per key; LRU and LFU additionally
//! wrap it with the handle that links it into their bookkeeping structure.
//!
//! ```text
//!   expire_at == 0          never expires
//!   expire_at >= now        live (an entry expiring "now" is still served)
//!   expire_at <  now        expired, removed on the next lookup
//! ```

use std::fmt;

use crate::clock::Timestamp;

/// Remaining lifetime of a live entry, as reported by `ttl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ttl {
    /// The entry has no expiration.
    Never,
    /// Whole seconds until the entry expires.
    Remaining(u64),
}

impl Ttl {
    /// Seconds code for this TTL: `-1` for [`Ttl::Never`], otherwise the
    /// remaining seconds.
    ///
    /// ```
    /// use evictcache::entry::Ttl;
    ///
    /// assert_eq!(Ttl::Never.as_secs(), -1);
    /// assert_eq!(Ttl::Remaining(30).as_secs(), 30);
    /// ```
    pub fn as_secs(&self) -> i64 {
        match *self {
            Ttl::Never => -1,
            Ttl::Remaining(secs) => i64::try_from(secs).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Never => f.write_str("never"),
            Ttl::Remaining(secs) => write!(f, "{secs}s"),
        }
    }
}

/// Value and absolute expiration timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    pub value: V,
    /// Unix seconds after which the entry is dead; `0` means never.
    pub expire_at: Timestamp,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, expire_at: Timestamp) -> Self {
        Self { value, expire_at }
    }

    /// Replaces value and expiration in place.
    pub fn overwrite(&mut self, value: V, expire_at: Timestamp) {
        self.value = value;
        self.expire_at = expire_at;
    }

    #[inline]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expire_at != 0 && self.expire_at < now
    }

    /// Remaining lifetime at `now`. Callers check [`is_expired`](Self::is_expired) first.
    pub fn ttl(&self, now: Timestamp) -> Ttl {
        if self.expire_at == 0 {
            Ttl::Never
        } else {
            Ttl::Remaining(self.expire_at.saturating_sub(now).max(0) as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_expire_at_never_expires() {
        let entry = CacheEntry::new("v", 0);
        assert!(!entry.is_expired(i64::MAX));
        assert_eq!(entry.ttl(123), Ttl::Never);
    }

    #[test]
    fn entry_expiring_now_is_live() {
        let entry = CacheEntry::new("v", 100);
        assert!(!entry.is_expired(99));
        assert!(!entry.is_expired(100));
        assert!(entry.is_expired(101));
    }

    #[test]
    fn ttl_counts_down() {
        let entry = CacheEntry::new(1u8, 130);
        assert_eq!(entry.ttl(100), Ttl::Remaining(30));
        assert_eq!(entry.ttl(130), Ttl::Remaining(0));
    }

    #[test]
    fn overwrite_replaces_both_fields() {
        let mut entry = CacheEntry::new(1, 50);
        entry.overwrite(2, 0);
        assert_eq!(entry, CacheEntry::new(2, 0));
    }

    #[test]
    fn ttl_seconds_codes() {
        assert_eq!(Ttl::Never.as_secs(), -1);
        assert_eq!(Ttl::Remaining(0).as_secs(), 0);
        assert_eq!(Ttl::Remaining(u64::MAX).as_secs(), i64::MAX);
    }

    #[test]
    fn ttl_display() {
        assert_eq!(Ttl::Never.to_string(), "never");
        assert_eq!(Ttl::Remaining(5).to_string(), "5s");
    }
}
