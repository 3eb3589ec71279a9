//! Storage layer for Tourney - durable media behind the persistence queue.
//!
//! The queue owns ordering and retry logic; a `QueueStore` only has to keep
//! an ordered list of items across process restarts.

mod jsonl;
mod memory;
mod traits;

pub use jsonl::JsonlQueueStore;
pub use memory::MemoryQueueStore;
pub use traits::QueueStore;

/// Collection name of pending queue items.
pub const PENDING_COLLECTION: &str = "queue";

/// Collection name of items evicted after too many failed attempts.
pub const DEAD_LETTER_COLLECTION: &str = "dead_letter";
