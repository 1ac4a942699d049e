//! evictcache: in-process key/value caches with interchangeable eviction
//! policies (simple, LRU, O(1) LFU), per-entry TTL and hit/miss statistics.
//!
//! ```
//! use evictcache::prelude::*;
//!
//! let cache = CacheBuilder::new(2).lru().build::<&str, u32>().unwrap();
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.set("c", 3);
//!
//! assert_eq!(cache.get(&"a"), Err(CacheError::NotFound));
//! assert_eq!(cache.ttl(&"c").map(|ttl| ttl.as_secs()), Ok(-1));
//! assert_eq!(cache.evict_count(), 1);
//! ```

pub mod builder;
pub mod clock;
pub mod ds;
pub mod entry;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod stats;
pub mod traits;

pub use crate::builder::{Cache, CacheBuilder, CachePolicy};
pub use crate::error::{CacheError, ConfigError};
pub use crate::policy::{LfuCache, LruCache, SimpleCache};
