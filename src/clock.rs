//! Time source used to stamp and check entry expiration.
//!
//! Timestamps are whole seconds since the Unix epoch. A cache receives its
//! clock once at construction as an `Arc<dyn Clock>`; swap in a
//! [`ManualClock`] to drive expiration deterministically in tests.
//!
//! ```
//! use std::sync::Arc;
//!
//! use evictcache::clock::{Clock, ManualClock};
//!
//! let clock = Arc::new(ManualClock::new(1_000));
//! assert_eq!(clock.expire_at(30), 1_030);
//! assert_eq!(clock.expire_at(0), 0); // never expires
//!
//! clock.advance(5);
//! assert_eq!(clock.now(), 1_005);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

/// Seconds since the Unix epoch. `0` in an expiration slot means "never".
pub type Timestamp = i64;

/// Pluggable source of the current time.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> Timestamp;

    /// Absolute expiration for a relative TTL; `0` when `ttl_secs <= 0`.
    fn expire_at(&self, ttl_secs: i64) -> Timestamp {
        if ttl_secs <= 0 {
            0
        } else {
            self.now().saturating_add(ttl_secs)
        }
    }
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Moves time forward by `secs` and returns the new time.
    pub fn advance(&self, secs: i64) -> Timestamp {
        let step = |now: Timestamp| Some(now.saturating_add(secs));
        match self.now.fetch_update(Ordering::SeqCst, Ordering::SeqCst, step) {
            Ok(prev) | Err(prev) => prev.saturating_add(secs),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
