//! Deferred persistence operations held by the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rating::RatingTable;
use crate::id::generate_queue_item_id;

/// Operation kind constants
pub mod operation_kinds {
    pub const SAVE_RATINGS: &str = "save-ratings";
}

/// A persistence operation, serialized as `{"kind": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum Operation {
    /// Persist the full rating table of one user
    SaveRatings { user_id: String, ratings: RatingTable },
}

impl Operation {
    pub fn save_ratings(user_id: impl Into<String>, ratings: RatingTable) -> Self {
        Operation::SaveRatings {
            user_id: user_id.into(),
            ratings,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::SaveRatings { .. } => operation_kinds::SAVE_RATINGS,
        }
    }
}

/// One queued operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique queue item identifier
    pub id: String,
    pub operation: Operation,
    pub enqueued_at: DateTime<Utc>,
    /// Failed delivery attempts so far
    #[serde(default)]
    pub attempts: u32,
}

impl QueueItem {
    pub fn new(operation: Operation) -> Self {
        Self {
            id: generate_queue_item_id(),
            operation,
            enqueued_at: Utc::now(),
            attempts: 0,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.operation.kind()
    }
}
