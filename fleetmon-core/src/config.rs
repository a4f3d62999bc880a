use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_api_url() -> String {
    "http://localhost:8000/api".into()
}
fn default_poll_interval() -> u64 {
    5000
}
fn default_alert_duration() -> u64 {
    5000
}
fn default_request_timeout() -> u64 {
    10_000
}

/// Dashboard settings file (`fleetmon.yaml`)
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DashboardConfig {
    /// Base URL of the status API, without a trailing slash
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How long an alert stays on screen
    #[serde(default = "default_alert_duration")]
    pub alert_duration_ms: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Where the TUI writes its tracing output
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_interval_ms: default_poll_interval(),
            alert_duration_ms: default_alert_duration(),
            request_timeout_ms: default_request_timeout(),
            log_file: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("'{field}' must be greater than zero")]
    ZeroInterval { field: &'static str },
    #[error("api_url must start with http:// or https://, got '{url}'")]
    InvalidUrl { url: String },
    #[error("no config file found, searched: {searched:?}")]
    NotFound { searched: Vec<PathBuf> },
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse from a YAML string (useful for testing)
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: DashboardConfig = serde_yaml::from_str(content)?;
        config.api_url = config.api_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Search for a config file in standard locations
    pub fn discover(start_dir: &Path) -> Result<(PathBuf, Self), ConfigError> {
        let names = [
            "fleetmon.yaml",
            "fleetmon.yml",
            ".fleetmon.yaml",
            ".fleetmon.yml",
        ];
        let mut searched = Vec::new();

        if let Ok(env_path) = std::env::var("FLEETMON_CONFIG") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Ok((path.clone(), Self::load(&path)?));
            }
            searched.push(path);
        }

        let mut dir = Some(start_dir);
        while let Some(current) = dir {
            for name in &names {
                let path = current.join(name);
                if path.exists() {
                    return Ok((path.clone(), Self::load(&path)?));
                }
                searched.push(path);
            }
            dir = current.parent();
        }

        Err(ConfigError::NotFound { searched })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                url: self.api_url.clone(),
            });
        }
        for (field, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("alert_duration_ms", self.alert_duration_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { field });
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn alert_duration(&self) -> Duration {
        Duration::from_millis(self.alert_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
