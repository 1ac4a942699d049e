//! Arena-backed data structures behind the LRU and LFU policies.

pub mod frequency_buckets;
pub mod intrusive_list;
pub mod slot_arena;

pub use frequency_buckets::{BucketId, FrequencyBuckets};
pub use intrusive_list::IntrusiveList;
pub use slot_arena::{SlotArena, SlotId};
