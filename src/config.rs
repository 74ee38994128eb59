//! Client configuration parsing and validation.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::endpoint::Endpoint;
use crate::transport::codec::DEFAULT_MAX_LINE_BYTES;
use crate::{AppError, Result};

fn default_endpoint() -> String {
    "127.0.0.1:16834".into()
}

fn default_response_timeout_ms() -> u64 {
    100
}

fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}

/// Client configuration parsed from a TOML file.
///
/// Every field is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ClientConfig {
    /// Server address as `host:port`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-command response timeout in milliseconds.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    /// Longest inbound line accepted before it is skipped.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            response_timeout_ms: default_response_timeout_ms(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

impl ClientConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Response timeout as a [`Duration`].
    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Check field values.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        Endpoint::parse(&self.endpoint)
            .map_err(|err| AppError::Config(format!("endpoint invalid: {err}")))?;

        if self.response_timeout_ms == 0 {
            return Err(AppError::Config(
                "response_timeout_ms must be greater than zero".into(),
            ));
        }

        if self.max_line_bytes == 0 {
            return Err(AppError::Config(
                "max_line_bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
