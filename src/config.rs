//! Link configuration
//!
//! Connection parameters with defaults matching the deployed plugin: a fixed
//! versioned socket path, a 5000 ms connect timeout, and 2 total send
//! attempts. All three are configurable; the timeout and attempt bound are
//! operational tuning knobs, not protocol constants.

use crate::{LinkError, Result, DEFAULT_SOCKET_PATH};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one [`crate::Link`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Socket path of the simulator-side endpoint.
    pub socket_path: PathBuf,
    /// Bound on how long a connect may block.
    pub connect_timeout_ms: u64,
    /// Total send attempts for a set request, including the first. Only
    /// transport faults consume attempts; semantic rejections never retry.
    pub send_attempts: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            connect_timeout_ms: 5000,
            send_attempts: 2,
        }
    }
}

impl LinkConfig {
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    pub fn with_send_attempts(mut self, attempts: u32) -> Self {
        self.send_attempts = attempts;
        self
    }

    /// Load and validate a configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| LinkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| LinkError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(LinkError::Config("socket_path must not be empty".to_string()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(LinkError::Config(
                "connect_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.send_attempts == 0 {
            return Err(LinkError::Config(
                "send_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
