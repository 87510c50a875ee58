//! Configuration file support for the shielded pool client.
//!
//! This module provides configuration file loading from TOML format,
//! allowing for easier deployment and configuration management.

use crate::error::CoreError;
use crate::pool::PoolKey;
use anyhow::{Context, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_POOL_FEE: u32 = 3000;
const DEFAULT_TICK_SPACING: i32 = 60;
const DEFAULT_ARTIFACT_BASE: &str = "artifacts";

/// Configuration for the shielded pool client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Settlement hook contract address, 0x-prefixed.
    #[serde(default)]
    pub hook_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub currency0: String,
    #[serde(default)]
    pub currency1: String,
    #[serde(default = "default_pool_fee")]
    pub fee: u32,
    #[serde(default = "default_tick_spacing")]
    pub tick_spacing: i32,
}

/// Where proving artifacts are fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Base URL (`kind = "http"`) or directory path (`kind = "dir"`).
    #[serde(default = "default_artifact_base")]
    pub base: String,
    #[serde(default)]
    pub kind: ArtifactStoreKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStoreKind {
    Http,
    #[default]
    Dir,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            hook_address: String::new(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            currency0: String::new(),
            currency1: String::new(),
            fee: DEFAULT_POOL_FEE,
            tick_spacing: DEFAULT_TICK_SPACING,
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_ARTIFACT_BASE.to_string(),
            kind: ArtifactStoreKind::default(),
        }
    }
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_pool_fee() -> u32 {
    DEFAULT_POOL_FEE
}

fn default_tick_spacing() -> i32 {
    DEFAULT_TICK_SPACING
}

fn default_artifact_base() -> String {
    DEFAULT_ARTIFACT_BASE.to_string()
}

impl NetworkConfig {
    /// Parses the configured hook address.
    pub fn hook(&self) -> Result<Address, CoreError> {
        parse_address("network.hook_address", &self.hook_address)
    }
}

impl PoolConfig {
    /// Builds the canonical pool key from the configured fields.
    ///
    /// The hook address doubles as the pool's hooks field: this deployment
    /// only shields pools settled by its own hook.
    pub fn pool_key(&self, hooks: Address) -> Result<PoolKey, CoreError> {
        Ok(PoolKey {
            currency0: parse_address("pool.currency0", &self.currency0)?,
            currency1: parse_address("pool.currency1", &self.currency1)?,
            fee: self.fee,
            tick_spacing: self.tick_spacing,
            hooks,
        })
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address, CoreError> {
    value
        .parse()
        .map_err(|e| CoreError::InvalidInput(format!("{field} is not an address: {e}")))
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn load_from_file_or_default(path: &PathBuf) -> Self {
        Self::load_from_file(path).unwrap_or_default()
    }

    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.pool.fee, DEFAULT_POOL_FEE);
        assert_eq!(config.pool.tick_spacing, DEFAULT_TICK_SPACING);
        assert_eq!(config.artifacts.kind, ArtifactStoreKind::Dir);
    }

    #[test]
    fn test_serialize_deserialize_config() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.network.rpc_url, deserialized.network.rpc_url);
        assert_eq!(config.artifacts.base, deserialized.artifacts.base);
    }

    #[test]
    fn test_custom_config() {
        let config_toml = r#"
            [network]
            rpc_url = "https://sepolia.example.org"
            hook_address = "0x3333333333333333333333333333333333333333"

            [pool]
            currency0 = "0x1111111111111111111111111111111111111111"
            currency1 = "0x2222222222222222222222222222222222222222"
            fee = 500
            tick_spacing = -10

            [artifacts]
            base = "https://artifacts.example.org/v1"
            kind = "http"
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert_eq!(config.network.rpc_url, "https://sepolia.example.org");
        assert_eq!(config.pool.fee, 500);
        assert_eq!(config.pool.tick_spacing, -10);
        assert_eq!(config.artifacts.kind, ArtifactStoreKind::Http);

        let hook = config.network.hook().unwrap();
        let key = config.pool.pool_key(hook).unwrap();
        assert_eq!(key.hooks, hook);
        assert_eq!(key.fee, 500);
    }

    #[test]
    fn test_out_of_range_pool_fee_never_yields_an_id() {
        let config = PoolConfig {
            currency0: "0x1111111111111111111111111111111111111111".to_string(),
            currency1: "0x2222222222222222222222222222222222222222".to_string(),
            fee: 1 << 24,
            ..PoolConfig::default()
        };
        let key = config.pool_key(Address::zero()).unwrap();
        assert!(matches!(key.id(), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_bad_address_rejected() {
        let config = PoolConfig {
            currency0: "not an address".to_string(),
            currency1: "0x2222222222222222222222222222222222222222".to_string(),
            ..PoolConfig::default()
        };
        assert!(config.pool_key(Address::zero()).is_err());
    }
}
