//! Service configuration: built-in defaults, an optional RON file and
//! environment overrides, applied in that order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use courier_engine::{BatchSettings, FetchSettings, RelayConfig, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind: String,
    /// Allowed browser origin; any origin when absent.
    pub cors_origin: Option<String>,
    pub log_level: String,
    pub fetch: FetchConfig,
    pub batch: BatchConfig,
    pub relay: RelayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            cors_origin: None,
            log_level: "info".to_string(),
            fetch: FetchConfig::default(),
            batch: BatchConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            user_agent: self.user_agent.clone(),
            ..FetchSettings::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Items per batch when the request names no limit.
    pub default_limit: usize,
    pub item_pause_ms: u64,
    pub channel_capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            default_limit: courier_core::DEFAULT_BATCH_LIMIT,
            item_pause_ms: 500,
            channel_capacity: 32,
        }
    }
}

impl BatchConfig {
    pub fn settings(&self) -> BatchSettings {
        BatchSettings {
            item_pause: Duration::from_millis(self.item_pause_ms),
            channel_capacity: self.channel_capacity,
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid with the RON file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Applies environment overrides. `lookup` is `std::env::var` in the
    /// binary; blank values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(host) = get("SMTP_HOST") {
            self.relay.host = Some(host);
        }
        if let Some(port) = get("SMTP_PORT") {
            let parsed = port.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnv {
                name: "SMTP_PORT",
                value: port.clone(),
            })?;
            self.relay.port = Some(parsed);
        }
        if let Some(user) = get("SMTP_USER") {
            self.relay.username = Some(user);
        }
        if let Some(password) = get("SMTP_PASSWORD") {
            self.relay.password = Some(password);
        }
        if let Some(from) = get("SMTP_FROM") {
            self.relay.from = Some(from);
        }
        if let Some(bind) = get("COURIER_BIND") {
            self.bind = bind;
        }
        Ok(())
    }
}
