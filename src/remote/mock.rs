//! Scripted remote save for tests and offline demos.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{RemoteSave, SaveOutcome};
use crate::domain::RatingTable;
use crate::error::{Result, TourneyError};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Returned as `Ok(outcome)`
    Outcome(SaveOutcome),
    /// Returned as `Err(TourneyError::Remote(..))`
    Fault(String),
}

impl MockResponse {
    pub fn success() -> Self {
        MockResponse::Outcome(SaveOutcome::ok())
    }

    pub fn failure(error: &str) -> Self {
        MockResponse::Outcome(SaveOutcome::failed(error))
    }

    pub fn fault(error: &str) -> Self {
        MockResponse::Fault(error.to_string())
    }
}

/// Replies from a script, then succeeds once the script runs out.
/// Every call is recorded.
#[derive(Debug, Default)]
pub struct MockRemoteSave {
    script: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<(String, RatingTable)>>,
    delay: Option<Duration>,
}

impl MockRemoteSave {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next unanswered call
    pub fn with_response(self, response: MockResponse) -> Self {
        self.push_response(response);
        self
    }

    /// Sleep this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_response(&self, response: MockResponse) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(response);
        }
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<(String, RatingTable)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RemoteSave for MockRemoteSave {
    async fn save(&self, user_id: &str, ratings: &RatingTable) -> Result<SaveOutcome> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.calls
            .lock()
            .map_err(|e| TourneyError::Remote(e.to_string()))?
            .push((user_id.to_string(), ratings.clone()));

        let next = self
            .script
            .lock()
            .map_err(|e| TourneyError::Remote(e.to_string()))?
            .pop_front();

        match next {
            None => Ok(SaveOutcome::ok()),
            Some(MockResponse::Outcome(outcome)) => Ok(outcome),
            Some(MockResponse::Fault(error)) => Err(TourneyError::Remote(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_default_success() {
        let mock = MockRemoteSave::new()
            .with_response(MockResponse::failure("nope"))
            .with_response(MockResponse::fault("boom"));
        let ratings = RatingTable::new();

        assert_eq!(mock.save("u", &ratings).await.unwrap(), SaveOutcome::failed("nope"));
        assert!(matches!(mock.save("u", &ratings).await, Err(TourneyError::Remote(e)) if e == "boom"));
        assert!(mock.save("u", &ratings).await.unwrap().success);
        assert_eq!(mock.call_count(), 3);
    }
}
