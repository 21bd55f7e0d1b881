//! # chainactions-solana
//!
//! Solana side of ChainActions:
//!
//! - [`SubscriptionManager`]: `programSubscribe` over a websocket, with a
//!   correlated handshake, ordered delivery and bounded, idempotent close
//! - [`wire`]: JSON-RPC request, acknowledgement and notification types
//! - [`SolanaAccountSource`]: turns notifications into candidates
//! - [`decode::account_update`]: base64 account data into an action

pub mod decode;
pub mod error;
pub mod source;
pub mod subscription;
pub mod wire;

pub use error::SubscriptionError;
pub use source::SolanaAccountSource;
pub use subscription::{
    open_on, NotificationReceiver, Subscription, SubscriptionConfig, SubscriptionManager,
    SubscriptionState,
};
pub use wire::{AccountData, AccountEncoding, AccountNotification, Commitment};
