pub use crate::builder::{Cache, CacheBuilder, CachePolicy};
pub use crate::clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use crate::entry::Ttl;
pub use crate::error::{CacheError, ConfigError};
pub use crate::policy::{LfuCache, LruCache, SimpleCache};
pub use crate::stats::{StatsAccessor, StatsSnapshot};
pub use crate::traits::{CacheConfig, CoreCache};
