//! Runner configuration via `runner.toml`
//!
//! A runner reads its management-plane endpoint, identity and reconnect
//! schedule from a TOML file. On first start a commented default file can be
//! written with [`RunnerConfig::write_default_if_missing`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::BackoffConfig;
use crate::error::{Result, RunnerError};

/// Config file name used by runner processes
pub const CONFIG_FILE_NAME: &str = "runner.toml";

fn default_endpoint() -> String {
    "ws://127.0.0.1:6420".to_string()
}

fn default_runner_name() -> String {
    "default".to_string()
}

fn default_outbound_buffer() -> usize {
    1024
}

/// Runner configuration loaded from `runner.toml`
///
/// # Example
///
/// ```toml
/// endpoint = "ws://127.0.0.1:6420"
/// runner_name = "default"
/// outbound_buffer = 1024
///
/// [backoff]
/// initial_delay_ms = 1000
/// max_delay_ms = 30000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Management plane address handed to the transport
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name this runner registers under
    #[serde(default = "default_runner_name")]
    pub runner_name: String,
    /// Stable key identifying this runner across restarts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_key: Option<String>,
    /// Frames held while disconnected before senders wait (default: 1024)
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// Time without a connection after which the runner counts as lost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lost_threshold_ms: Option<u64>,
    /// Reconnect schedule
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            endpoint: default_endpoint(),
            runner_name: default_runner_name(),
            runner_key: None,
            outbound_buffer: default_outbound_buffer(),
            lost_threshold_ms: None,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Identity presented during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerIdentity {
    /// Runner name
    pub name: String,
    /// Optional stable runner key
    pub key: Option<String>,
}

impl RunnerConfig {
    /// Config for `endpoint` with every other field defaulted
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        RunnerConfig {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Identity presented during the handshake
    pub fn identity(&self) -> RunnerIdentity {
        RunnerIdentity {
            name: self.runner_name.clone(),
            key: self.runner_key.clone(),
        }
    }

    /// Lost threshold as a duration, `None` when disabled
    pub fn lost_threshold(&self) -> Option<Duration> {
        self.lost_threshold_ms.map(Duration::from_millis)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(RunnerError::Config("endpoint cannot be empty".into()));
        }
        if self.runner_name.trim().is_empty() {
            return Err(RunnerError::Config("runner_name cannot be empty".into()));
        }
        if self.outbound_buffer == 0 {
            return Err(RunnerError::Config(
                "outbound_buffer must be greater than zero".into(),
            ));
        }
        if self.lost_threshold_ms == Some(0) {
            return Err(RunnerError::Config(
                "lost_threshold_ms must be greater than zero".into(),
            ));
        }
        self.backoff.validate()
    }

    /// Returns the default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# Runner configuration
#
# Management plane address
endpoint = "ws://127.0.0.1:6420"

# Name this runner registers under
runner_name = "default"

# Stable key identifying this runner across restarts (optional)
# runner_key = "runner-1"

# Outbound frames held while disconnected (default: 1024)
outbound_buffer = 1024

# Report the runner as lost after this long without a connection (optional)
# lost_threshold_ms = 60000

# Reconnect schedule: delay = min(initial * multiplier^attempt, max),
# spread by up to 25% when jitter is on. Retries never stop on their own.
[backoff]
initial_delay_ms = 1000
max_delay_ms = 30000
multiplier = 2.0
jitter = true
"#
    }

    /// Parse and validate config from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunnerConfig = toml::from_str(content)
            .map_err(|e| RunnerError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RunnerError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Write the default config file if it does not already exist
    ///
    /// Returns true if the file was created.
    pub fn write_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| {
            RunnerError::Config(format!(
                "Failed to write default config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(true)
    }
}
