//! Remote save seam
//!
//! The queue delivers operations through the `RemoteSave` trait; the actual
//! service is supplied by the host application.

mod http;
mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::RatingTable;
use crate::error::Result;

pub use http::{HttpRemoteSave, HttpSinkConfig};
pub use mock::{MockRemoteSave, MockResponse};

/// Success/failure contract of a remote save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Persists ratings for a user somewhere outside this process.
///
/// `Ok` with `success: false` is an explicit failure; `Err` is an unexpected
/// fault. The queue treats both the same way.
#[async_trait]
pub trait RemoteSave: Send + Sync {
    async fn save(&self, user_id: &str, ratings: &RatingTable) -> Result<SaveOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        assert!(SaveOutcome::ok().success);
        let failed = SaveOutcome::failed("row locked");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("row locked"));
    }

    #[test]
    fn test_outcome_parses_without_error_field() {
        let outcome: SaveOutcome = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(outcome, SaveOutcome::ok());
    }
}
