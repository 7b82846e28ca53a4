//! Container configuration.

use crate::core::{Error, Result};
use crate::logging::LoggerConfig;
use serde::{Deserialize, Serialize};

/// Container configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Logger settings
    pub logger: LoggerConfig,
    /// Reject `start()` unless unmounted and `unmount()` while unmounted.
    ///
    /// Off by default: repeated calls re-run their phases.
    pub strict_lifecycle: bool,
}

impl ContainerConfig {
    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Enable the re-entry guard.
    pub fn strict(mut self) -> Self {
        self.strict_lifecycle = true;
        self
    }
}
