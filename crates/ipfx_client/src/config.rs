//! Client configuration: node endpoint, gas and polling parameters, contract deployment.
//!
//! Load from: env `IPFX_CONFIG_PATH`, or `./config/ipfx.json`, or `./ipfx.json`.
//! `IPFX_NODE_URL` overrides the node URL from any source.

use crate::chain::{NodeConfig, DEFAULT_NODE_URL};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "IPFX_CONFIG_PATH";
pub const NODE_URL_ENV: &str = "IPFX_NODE_URL";
/// Upper bound on how long a submitted transaction stays valid.
pub const MAX_EXPIRATION_SECS: u64 = 86_400;

/// Liquidswap router/pool account on Aptos.
pub const LIQUIDSWAP_ADDRESS: &str =
    "0x190d44266241744264b964a37b8f09863167a12d3e70cda39376cfb4e3561e12";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid: {0}")]
    Invalid(String),
}

/// Where the IP Fractionizer and exchange contracts live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Account holding `patent_token`, `royalty_distributor` and `governance`.
    /// When unset the modules are looked up under the acting account.
    #[serde(default)]
    pub module_address: Option<Address>,
    pub liquidswap_address: Address,
}

impl Default for Deployment {
    fn default() -> Self {
        Self {
            module_address: None,
            liquidswap_address: LIQUIDSWAP_ADDRESS
                .parse()
                .unwrap_or(Address::ZERO),
        }
    }
}

impl Deployment {
    /// Module account for an action taken by `acting`.
    pub fn modules_for(&self, acting: Address) -> Address {
        self.module_address.unwrap_or(acting)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub node_url: String,
    pub request_timeout_ms: u64,
    /// Interval between `transactions/by_hash` polls while awaiting confirmation.
    pub poll_interval_ms: u64,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    /// Transaction expiration, relative to submission time.
    pub expiration_secs: u64,
    /// Check view/entry calls against the module ABI before sending.
    pub validate_abi: bool,
    pub simulate_before_submit: bool,
    pub deployment: Deployment,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            request_timeout_ms: 30_000,
            poll_interval_ms: 500,
            max_gas_amount: 200_000,
            gas_unit_price: 100,
            expiration_secs: 600,
            validate_abi: true,
            simulate_before_submit: true,
            deployment: Deployment::default(),
        }
    }
}

impl ClientConfig {
    /// Load config from path, then apply env overrides.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load config: env IPFX_CONFIG_PATH, then ./config/ipfx.json, then ./ipfx.json, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load_from_path(Path::new(&path));
        }
        for candidate in [Path::new("./config/ipfx.json"), Path::new("./ipfx.json")] {
            if candidate.exists() {
                return Self::load_from_path(candidate);
            }
        }
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(NODE_URL_ENV) {
            if !url.trim().is_empty() {
                self.node_url = url.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.node_url)
            .map_err(|e| ConfigError::Invalid(format!("node_url {}: {}", self.node_url, e)))?;
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".into()));
        }
        if self.max_gas_amount == 0 {
            return Err(ConfigError::Invalid("max_gas_amount must be > 0".into()));
        }
        if !(1..=MAX_EXPIRATION_SECS).contains(&self.expiration_secs) {
            return Err(ConfigError::Invalid(format!(
                "expiration_secs {} outside 1..={}",
                self.expiration_secs, MAX_EXPIRATION_SECS
            )));
        }
        Ok(())
    }

    pub fn node_config(&self) -> NodeConfig {
        NodeConfig {
            base_url: self.node_url.clone(),
            request_timeout_ms: self.request_timeout_ms,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
