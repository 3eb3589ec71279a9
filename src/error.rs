//! Error types for Tourney
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::domain::PreferenceKey;

/// All error types that can occur in Tourney
#[derive(Debug, Error)]
pub enum TourneyError {
    /// A preference was recorded for a pair other than the one being served
    #[error("Unexpected pair: expected {expected}, got {got}")]
    UnexpectedPair { expected: String, got: PreferenceKey },

    /// Item identifier not part of the tournament
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    /// The same identifier was given twice at construction
    #[error("Duplicate item: {0}")]
    DuplicateItem(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote save service error
    #[error("Remote error: {0}")]
    Remote(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Tourney operations
pub type Result<T> = std::result::Result<T, TourneyError>;
