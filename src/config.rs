//! Configuration management for Quotagate.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::{QuotagateError, Result};

/// Main configuration for the Quotagate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotagateConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitConfig,
}

impl Default for QuotagateConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limiting: RateLimitConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Interval between background eviction sweeps, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "127.0.0.1:8080".parse().unwrap()
}

fn default_sweep_interval() -> u64 {
    30
}

/// Rate limiting configuration.
///
/// Immutable once a limiter has been constructed from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window duration in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Maximum requests permitted per window.
    ///
    /// A value of 0 is a valid configuration meaning "always reject".
    #[serde(default = "default_max")]
    pub max: u64,

    /// How long an expired window entry is retained before eviction,
    /// in milliseconds
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max: default_max(),
            grace_ms: default_grace_ms(),
        }
    }
}

fn default_window_ms() -> u64 {
    600_000
}

fn default_max() -> u64 {
    20
}

fn default_grace_ms() -> u64 {
    60_000
}

impl RateLimitConfig {
    /// Validate the rate limiting configuration.
    ///
    /// A zero-length window is rejected rather than clamped: silently
    /// substituting a different window could turn an operator mistake into
    /// an unbounded-allow or always-deny limiter.
    pub fn validate(&self) -> Result<()> {
        if self.window_ms == 0 {
            return Err(QuotagateError::Config(
                "window_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl QuotagateConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: QuotagateConfig = serde_yaml::from_str(&contents)
            .map_err(|e| QuotagateError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Validate the full configuration.
    pub fn validate(&self) -> Result<()> {
        self.rate_limiting.validate()
    }
}
