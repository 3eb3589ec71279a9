//! Storage trait for the durable queue medium.

use crate::domain::QueueItem;
use crate::error::Result;

/// Durable backing for an ordered sequence of queue items.
///
/// Each call must be atomic on its own: after a crash, `load` returns either
/// the state before the call or the state after it.
pub trait QueueStore: Send + Sync {
    /// Read every stored item, head first.
    fn load(&self) -> Result<Vec<QueueItem>>;

    /// Add one item at the tail.
    fn append(&self, item: &QueueItem) -> Result<()>;

    /// Replace the stored sequence with `items`.
    fn replace_all(&self, items: &[QueueItem]) -> Result<()>;
}
