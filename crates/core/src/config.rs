// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replication configuration
//!
//! All fields are optional with defaults. The identity-resolution policy and
//! bootstrap overrides are strategy objects passed to the replicator at
//! construction time, not configuration data.

use crate::tx::TxId;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Tunables for one replication run
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplicationConfig {
    /// Explicit starting position, overriding the destination checkpoint
    #[serde(default)]
    pub start_t: Option<TxId>,
    /// How long the poller sleeps when caught up with the source log
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Pause before retrying a transaction after a transient commit timeout
    #[serde(default = "default_retry_pause", with = "humantime_serde")]
    pub retry_pause: Duration,
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_retry_pause() -> Duration {
    Duration::from_secs(10)
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            start_t: None,
            poll_interval: default_poll_interval(),
            retry_pause: default_retry_pause(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parse a TOML configuration document
pub fn parse_config(content: &str) -> Result<ReplicationConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
