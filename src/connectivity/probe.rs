//! Reachability probe that feeds a [`ConnectivitySignal`].

use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinHandle;

use super::signal::ConnectivitySignal;
use crate::error::{Result, TourneyError};

/// Configuration for the HTTP probe
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
}

impl ProbeConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(3),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Polls a URL; any HTTP answer counts as online, a transport error as offline.
pub struct HttpProbe {
    client: Client,
    config: ProbeConfig,
}

impl HttpProbe {
    pub fn new(config: ProbeConfig) -> Result<Self> {
        if config.interval.is_zero() {
            return Err(TourneyError::Config("probe interval must be greater than zero".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TourneyError::Remote(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Probe once.
    pub async fn check(&self) -> bool {
        match self.client.head(&self.config.url).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(url = %self.config.url, error = %e, "Probe failed");
                false
            }
        }
    }

    /// Probe forever, publishing each result. Abort the handle to stop.
    pub fn spawn(self, signal: ConnectivitySignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            loop {
                ticker.tick().await;
                let online = self.check().await;
                signal.set_online(online);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_url_is_offline() {
        let config = ProbeConfig {
            url: "http://127.0.0.1:9/health".to_string(),
            interval: Duration::from_millis(50),
            timeout: Duration::from_millis(300),
        };
        let probe = HttpProbe::new(config).unwrap();
        assert!(!probe.check().await);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ProbeConfig::new("http://127.0.0.1:9/health").with_interval(Duration::ZERO);
        assert!(matches!(HttpProbe::new(config), Err(TourneyError::Config(_))));
    }

    #[tokio::test]
    async fn test_spawned_probe_publishes_offline() {
        let config = ProbeConfig::new("http://127.0.0.1:9/health").with_interval(Duration::from_millis(10));
        let probe = HttpProbe::new(config).unwrap();
        let signal = ConnectivitySignal::new(true);
        let mut rx = signal.subscribe();

        let handle = probe.spawn(signal.clone());
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("probe should publish")
            .unwrap();
        assert!(!signal.is_online());
        handle.abort();
    }
}
