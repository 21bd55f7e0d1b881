//! # chainactions-evm
//!
//! The EVM half of ChainActions:
//! - [`source`]: filters raw logs by contract address and topic count
//! - [`signatures`]: keccak256 signature words of the tracked events
//! - [`decode`]: per-kind decode routines producing actions
//! - [`listener`]: `eth_subscribe("logs")` websocket feed
//!
//! Topic layout follows the ABI: topics[0] is the event signature, the rest
//! are indexed parameters (one 32-byte word each), and `data` holds the
//! non-indexed parameters.

pub mod decode;
pub mod error;
pub mod listener;
pub mod signatures;
pub mod source;

pub use error::ListenerError;
pub use listener::{EvmLogListener, ListenerConfig, LogStream};
pub use signatures::user_action_table;
pub use source::{EvmLog, EvmLogSource};
