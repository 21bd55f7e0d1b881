//! Decoded, kind-specific actions handed to the sink.

use crate::chain::Network;
use crate::config::TokenConfig;
use crate::event::EventKind;
use alloy_primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ancillary metadata the decode routines stamp onto every action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    pub network: Network,
    pub token: TokenConfig,
    pub observed_at: DateTime<Utc>,
}

/// A token transfer between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAction {
    pub network: Network,
    pub transaction_hash: B256,
    pub log_index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub sender: Address,
    pub recipient: Address,
    /// Raw integer amount; divide by 10^decimals for display
    pub amount: U256,
    pub token: TokenConfig,
    pub observed_at: DateTime<Utc>,
}

/// Underlying tokens wrapped into the fluid token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintAction {
    pub network: Network,
    pub transaction_hash: B256,
    pub log_index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub account: Address,
    pub amount: U256,
    pub token: TokenConfig,
    pub observed_at: DateTime<Utc>,
}

/// Fluid tokens unwrapped back into the underlying token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnAction {
    pub network: Network,
    pub transaction_hash: B256,
    pub log_index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub account: Address,
    pub amount: U256,
    pub token: TokenConfig,
    pub observed_at: DateTime<Utc>,
}

/// New state of an account owned by the subscribed program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdateAction {
    pub network: Network,
    pub slot: u64,
    pub pubkey: String,
    pub owner: String,
    pub lamports: u64,
    pub executable: bool,
    pub rent_epoch: u64,
    /// Decoded account data
    pub data: Bytes,
    pub observed_at: DateTime<Utc>,
}

/// One fully decoded action, ready for publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Transfer(TransferAction),
    Mint(MintAction),
    Burn(BurnAction),
    AccountUpdate(AccountUpdateAction),
}

impl Action {
    /// The event kind this action was decoded from.
    pub fn kind(&self) -> EventKind {
        match self {
            Action::Transfer(_) => EventKind::Transfer,
            Action::Mint(_) => EventKind::MintFluid,
            Action::Burn(_) => EventKind::BurnFluid,
            Action::AccountUpdate(_) => EventKind::AccountUpdate,
        }
    }

    pub fn network(&self) -> Network {
        match self {
            Action::Transfer(a) => a.network,
            Action::Mint(a) => a.network,
            Action::Burn(a) => a.network,
            Action::AccountUpdate(a) => a.network,
        }
    }
}
