//! HTTP implementation of the remote save seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{RemoteSave, SaveOutcome};
use crate::domain::RatingTable;
use crate::error::{Result, TourneyError};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the HTTP sink
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// Base URL; ratings are POSTed to `{endpoint}/ratings`
    pub endpoint: String,
    pub timeout: Duration,
}

impl HttpSinkConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Saves ratings by POSTing JSON to a ratings service.
pub struct HttpRemoteSave {
    client: Client,
    url: String,
}

impl HttpRemoteSave {
    pub fn new(config: HttpSinkConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(TourneyError::Config("remote endpoint is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TourneyError::Remote(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: ratings_url(&config.endpoint),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn ratings_url(endpoint: &str) -> String {
    format!("{}/ratings", endpoint.trim_end_matches('/'))
}

/// Interpret a response: non-2xx fails; a 2xx body may carry its own verdict.
fn interpret(status: reqwest::StatusCode, body: &str) -> SaveOutcome {
    if !status.is_success() {
        let detail = body.trim();
        return if detail.is_empty() {
            SaveOutcome::failed(format!("HTTP {}", status))
        } else {
            SaveOutcome::failed(format!("HTTP {}: {}", status, detail))
        };
    }

    match serde_json::from_str::<SaveOutcome>(body) {
        Ok(outcome) => outcome,
        Err(_) => SaveOutcome::ok(),
    }
}

#[async_trait]
impl RemoteSave for HttpRemoteSave {
    async fn save(&self, user_id: &str, ratings: &RatingTable) -> Result<SaveOutcome> {
        let body = json!({
            "user_id": user_id,
            "ratings": ratings,
        });

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let outcome = interpret(status, &text);
        tracing::debug!(user_id, status = status.as_u16(), success = outcome.success, "Remote save answered");
        Ok(outcome)
    }
}
