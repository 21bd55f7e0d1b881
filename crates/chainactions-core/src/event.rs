//! Candidate and classified event types.

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of event kinds the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Transfer,
    MintFluid,
    BurnFluid,
    AccountUpdate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Transfer => "transfer",
            EventKind::MintFluid => "mint_fluid",
            EventKind::BurnFluid => "burn_fluid",
            EventKind::AccountUpdate => "account_update",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An EVM log that passed source filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCandidate {
    /// Contract that emitted the log
    pub address: Address,
    /// topics[0], the event signature word
    pub signature: B256,
    /// topics[1..], in order
    pub topics: Vec<B256>,
    /// Non-indexed parameters, opaque at this stage
    pub data: Bytes,
    pub transaction_hash: B256,
    pub log_index: u64,
    pub block_number: Option<u64>,
}

/// Account state as delivered by a program notification.
/// `data` is still in its wire encoding (`encoding` names it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub lamports: u64,
    pub data: String,
    pub encoding: String,
    pub owner: String,
    pub executable: bool,
    pub rent_epoch: u64,
}

/// A Solana program-account change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCandidate {
    pub slot: u64,
    /// Base58 account address
    pub pubkey: String,
    /// Correlation id of the subscription that delivered it
    pub subscription: u64,
    pub account: AccountState,
}

/// Raw, untrusted input normalized across both origin feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateEvent {
    Evm(LogCandidate),
    Solana(AccountCandidate),
}

impl CandidateEvent {
    /// Short origin label used in logs and invariant errors.
    pub fn origin(&self) -> &'static str {
        match self {
            CandidateEvent::Evm(_) => "evm",
            CandidateEvent::Solana(_) => "solana",
        }
    }
}

/// A candidate tagged with the kind the classifier assigned to it.
///
/// Normally built by [`Classifier`](crate::classifier::Classifier). Pairings
/// built by hand are not checked here; the dispatcher rejects any kind it has
/// no route for on the candidate's origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    kind: EventKind,
    event: CandidateEvent,
}

impl ClassifiedEvent {
    pub fn new(kind: EventKind, event: CandidateEvent) -> Self {
        Self { kind, event }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn event(&self) -> &CandidateEvent {
        &self.event
    }

    pub fn into_parts(self) -> (EventKind, CandidateEvent) {
        (self.kind, self.event)
    }
}
