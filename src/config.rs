use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tourney::connectivity::ProbeConfig;
use tourney::queue::QueueConfig;
use tourney::rating::Elo;
use tourney::remote::HttpSinkConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub connectivity: ConnectivityConfig,
    pub queue: QueueSection,
    pub rating: RatingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub queue_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            queue_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tourney"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            timeout_ms: 10000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub probe_url: Option<String>,
    pub probe_interval_ms: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: None,
            probe_interval_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSection {
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub initial: f64,
    pub k_factor: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        let elo = Elo::default();
        Self {
            initial: elo.initial,
            k_factor: elo.k_factor,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            storage: StorageConfig::default(),
            remote: RemoteConfig::default(),
            connectivity: ConnectivityConfig::default(),
            queue: QueueSection::default(),
            rating: RatingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_attempts: self.queue.max_attempts,
        }
    }

    pub fn sink_config(&self) -> HttpSinkConfig {
        HttpSinkConfig::new(self.remote.endpoint.clone()).with_timeout(Duration::from_millis(self.remote.timeout_ms))
    }

    /// Probe settings, if a probe URL is configured. A zero interval is rejected.
    pub fn probe_config(&self) -> Result<Option<ProbeConfig>> {
        let Some(url) = &self.connectivity.probe_url else {
            return Ok(None);
        };
        if self.connectivity.probe_interval_ms == 0 {
            return Err(eyre::eyre!("connectivity.probe_interval_ms must be greater than zero"));
        }
        Ok(Some(
            ProbeConfig::new(url.clone()).with_interval(Duration::from_millis(self.connectivity.probe_interval_ms)),
        ))
    }

    pub fn elo(&self) -> Elo {
        Elo::new(self.rating.initial, self.rating.k_factor)
    }
}
