// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harness configuration
//!
//! Defaults reproduce the fixed behavior of the harness: five workers dialing
//! `[::1]:8888`, a 1024-byte reply buffer and a one second pause between steps.
//! A TOML file may override any field; unknown keys are rejected.

use std::net::{Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload every worker writes to its connection.
pub const PAYLOAD: &[u8] = b"ping";

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_WORKER_COUNT: usize = 5;
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_secs(1);

/// Largest reply buffer a worker will allocate
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// What the coordinator does when a worker hits an I/O error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// First failure aborts every sibling and fails the run
    #[default]
    Abort,
    /// Siblings keep running; failures are collected into the report
    Isolate,
}

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Address every worker dials
    pub endpoint: SocketAddr,
    /// Number of concurrent connections
    pub worker_count: usize,
    /// Size of the single-read reply buffer
    pub buffer_size: usize,
    /// Pause before send, before receive and before close
    #[serde(with = "humantime_serde")]
    pub step_delay: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            endpoint: SocketAddr::from((Ipv6Addr::LOCALHOST, DEFAULT_PORT)),
            worker_count: DEFAULT_WORKER_COUNT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            step_delay: DEFAULT_STEP_DELAY,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl HarnessConfig {
    /// Parse a TOML document; missing keys fall back to defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn with_endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid {
                field: "worker_count",
                reason: "must be at least 1",
            });
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid {
                field: "buffer_size",
                reason: "must be at least 1 byte",
            });
        }
        if self.buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::Invalid {
                field: "buffer_size",
                reason: "must be at most 64 MiB",
            });
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
