//! HTTP client configuration.
//!
//! The download core never reads the environment or files itself; callers
//! build a [`ClientConfig`] (the CLI maps its flags onto one) and hand it to
//! [`HttpClient::new`](crate::download::HttpClient::new).

use std::time::Duration;

use serde::Deserialize;

use crate::download::constants::{CONNECT_TIMEOUT_SECS, MAX_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::user_agent;

/// Transport configuration for [`HttpClient`](crate::download::HttpClient).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds, covering the streamed body.
    pub read_timeout_secs: u64,
    /// User-Agent sent when the request does not carry its own.
    pub user_agent: String,
    /// Transparently decompress gzip-encoded bodies.
    pub gzip: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            user_agent: user_agent::default_user_agent(),
            gzip: true,
        }
    }
}

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid config value for `{field}`: {value}. Expected range: 1..={max}")]
pub struct ConfigError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Value that was supplied.
    pub value: u64,
    /// Upper bound of the accepted range.
    pub max: u64,
}

impl ClientConfig {
    /// Validates timeout ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a timeout is zero or exceeds one day.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if (1..=MAX_TIMEOUT_SECS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError {
            field,
            value,
            max: MAX_TIMEOUT_SECS,
        })
    }
}
