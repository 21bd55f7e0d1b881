//! Application configuration: a YAML file plus `CHAINACTIONS_*` overrides.
//!
//! ```yaml
//! pipeline:
//!   network: ethereum
//!   filter_address: "0x9d1089802eE608BA84C5c98211afE5f37F96B36C"
//!   token: { symbol: fUSDC, decimals: 6 }
//! evm:
//!   ws_url: wss://mainnet.infura.io/ws/v3/KEY
//! solana:
//!   ws_url: wss://api.mainnet-beta.solana.com
//!   program_id: TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA
//!   commitment: confirmed
//! log:
//!   level: info
//!   json: false
//! ```

use anyhow::{bail, Context, Result};
use chainactions_core::{config::parse_address, ConfigError, Network, PipelineConfig, TokenConfig};
use chainactions_evm::ListenerConfig;
use chainactions_observability::LogConfig;
use chainactions_solana::SubscriptionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_FILTER_ADDRESS: &str = "CHAINACTIONS_FILTER_ADDRESS";
pub const ENV_TOKEN_SYMBOL: &str = "CHAINACTIONS_TOKEN_SYMBOL";
pub const ENV_TOKEN_DECIMALS: &str = "CHAINACTIONS_TOKEN_DECIMALS";
pub const ENV_NETWORK: &str = "CHAINACTIONS_NETWORK";
pub const ENV_EVM_WS_URL: &str = "CHAINACTIONS_EVM_WS_URL";
pub const ENV_SOLANA_WS_URL: &str = "CHAINACTIONS_SOLANA_WS_URL";
pub const ENV_SOLANA_PROGRAM_ID: &str = "CHAINACTIONS_SOLANA_PROGRAM_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub evm: EvmSection,
    #[serde(default)]
    pub solana: SolanaSection,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSection {
    #[serde(default)]
    pub network: Option<Network>,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub filter_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmSection {
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default = "default_evm_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_evm_channel_capacity() -> usize {
    512
}

impl Default for EvmSection {
    fn default() -> Self {
        Self {
            ws_url: None,
            channel_capacity: default_evm_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolanaSection {
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(flatten)]
    pub subscription: SubscriptionConfig,
}

impl AppConfig {
    /// Read the YAML file (if any) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                Self::from_yaml(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply `CHAINACTIONS_*` overrides looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(network) = lookup(ENV_NETWORK) {
            self.pipeline.network = Some(network.parse()?);
        }
        if let Some(address) = lookup(ENV_FILTER_ADDRESS) {
            self.pipeline.filter_address = Some(address);
        }
        if let Some(symbol) = lookup(ENV_TOKEN_SYMBOL) {
            self.pipeline.token.symbol = symbol;
        }
        if let Some(decimals) = lookup(ENV_TOKEN_DECIMALS) {
            self.pipeline.token.decimals =
                decimals
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        field: "token.decimals",
                        reason: e.to_string(),
                    })?;
        }
        if let Some(url) = lookup(ENV_EVM_WS_URL) {
            self.evm.ws_url = Some(url);
        }
        if let Some(url) = lookup(ENV_SOLANA_WS_URL) {
            self.solana.ws_url = Some(url);
        }
        if let Some(program_id) = lookup(ENV_SOLANA_PROGRAM_ID) {
            self.solana.program_id = Some(program_id);
        }
        Ok(())
    }

    /// The validated pipeline configuration for an EVM run.
    pub fn evm_pipeline(&self) -> Result<PipelineConfig> {
        let network = self.pipeline.network.unwrap_or(Network::Ethereum);
        if !network.is_evm() {
            bail!("network {network} is not an EVM network; use the solana command");
        }
        let address = self
            .pipeline
            .filter_address
            .as_deref()
            .ok_or(ConfigError::MissingField("pipeline.filter_address"))?;
        let config = PipelineConfig::evm(network, parse_address(address)?, self.pipeline.token.clone());
        config.validate()?;
        Ok(config)
    }

    /// The validated pipeline configuration for a Solana run.
    pub fn solana_pipeline(&self) -> Result<PipelineConfig> {
        let network = self.pipeline.network.unwrap_or(Network::Solana);
        if network != Network::Solana {
            bail!("network {network} is not solana; use the evm command");
        }
        let config = PipelineConfig {
            token: self.pipeline.token.clone(),
            ..PipelineConfig::solana()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn evm_listener(&self) -> Result<ListenerConfig> {
        let ws_url = self
            .evm
            .ws_url
            .clone()
            .ok_or(ConfigError::MissingField("evm.ws_url"))?;
        Ok(ListenerConfig {
            ws_url,
            channel_capacity: self.evm.channel_capacity,
        })
    }

    /// Endpoint and program id of the Solana subscription.
    pub fn solana_target(&self) -> Result<(String, String)> {
        let ws_url = self
            .solana
            .ws_url
            .clone()
            .ok_or(ConfigError::MissingField("solana.ws_url"))?;
        let program_id = self
            .solana
            .program_id
            .clone()
            .ok_or(ConfigError::MissingField("solana.program_id"))?;
        Ok((ws_url, program_id))
    }
}
