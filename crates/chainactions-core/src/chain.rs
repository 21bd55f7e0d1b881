//! Network selector.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The network a pipeline instance tracks.
/// Also selects the fixed sink topic actions are published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Arbitrum,
    Solana,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Arbitrum => "arbitrum",
            Network::Solana => "solana",
        }
    }

    /// `true` for networks that produce EVM logs.
    pub fn is_evm(&self) -> bool {
        matches!(self, Network::Ethereum | Network::Arbitrum)
    }

    /// Sink topic that every action from this network is published under.
    pub fn user_actions_topic(&self) -> &'static str {
        match self {
            Network::Ethereum => "user-actions.ethereum",
            Network::Arbitrum => "user-actions.arbitrum",
            Network::Solana => "user-actions.solana",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" => Ok(Network::Ethereum),
            "arbitrum" => Ok(Network::Arbitrum),
            "solana" => Ok(Network::Solana),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}
