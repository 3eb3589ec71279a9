//! Offline-resilient persistence queue.
//!
//! Save operations are appended durably and delivered strictly in order,
//! one at a time, whenever a drain pass runs. See [`PersistenceQueue`].

mod persistence;

pub use persistence::{DrainOutcome, DrainReport, PersistenceQueue, QueueConfig};
