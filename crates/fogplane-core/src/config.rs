//! fogplane.toml configuration parser.
//!
//! All fields are optional in the file; missing sections fall back to
//! the documented defaults. `validate` runs once at startup — liveness
//! misconfiguration is a contract violation that must stop the daemon,
//! not surface per-request.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::bail;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FogplaneConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Node freshness window in seconds.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    /// Expiry sweep interval in seconds. Keep at or below a third of
    /// the TTL so stale records outlive the TTL by a bounded amount.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_port() -> u16 {
    7070
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/fogplane")
}

fn default_ttl_seconds() -> u64 {
    90
}

fn default_sweep_interval_seconds() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl Default for FogplaneConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl FogplaneConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FogplaneConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject contract-violating values before any subsystem starts.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.registry.ttl_seconds == 0 {
            bail!("registry.ttl_seconds must be greater than zero");
        }
        if self.registry.sweep_interval_seconds == 0 {
            bail!("registry.sweep_interval_seconds must be greater than zero");
        }
        if self.registry.sweep_interval_seconds > self.registry.ttl_seconds {
            bail!(
                "registry.sweep_interval_seconds ({}) must not exceed ttl_seconds ({})",
                self.registry.sweep_interval_seconds,
                self.registry.ttl_seconds
            );
        }
        Ok(())
    }
}
