//! Immutable pipeline configuration.
//!
//! Built once (by the CLI or a test) and passed into constructors; nothing
//! in the pipeline reads the environment.

use crate::chain::Network;
use crate::error::ConfigError;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Token details stamped onto every EVM action so downstream consumers can
/// format amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Short name, e.g. "fUSDC"
    pub symbol: String,
    /// Decimal places of the raw integer amounts
    pub decimals: u8,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            symbol: "fUSDC".into(),
            decimals: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub network: Network,
    #[serde(default)]
    pub token: TokenConfig,
    /// Contract whose logs are tracked. Required on EVM networks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_address: Option<Address>,
}

impl PipelineConfig {
    pub fn evm(network: Network, filter_address: Address, token: TokenConfig) -> Self {
        Self {
            network,
            token,
            filter_address: Some(filter_address),
        }
    }

    pub fn solana() -> Self {
        Self {
            network: Network::Solana,
            token: TokenConfig::default(),
            filter_address: None,
        }
    }

    /// Checks the combination of fields is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.is_evm() && self.filter_address.is_none() {
            return Err(ConfigError::MissingField("filter_address"));
        }
        if self.token.symbol.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "token.symbol",
                reason: "must not be empty".into(),
            });
        }
        // U256 holds at most 78 decimal digits
        if self.token.decimals > 77 {
            return Err(ConfigError::InvalidValue {
                field: "token.decimals",
                reason: format!("{} is out of range", self.token.decimals),
            });
        }
        Ok(())
    }
}

/// Parse a hex address, mapping failures into [`ConfigError`].
pub fn parse_address(value: &str) -> Result<Address, ConfigError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|e| ConfigError::InvalidAddress {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
