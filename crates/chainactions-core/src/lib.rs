//! # chainactions-core
//!
//! Core types shared by every ChainActions crate.
//!
//! ```text
//! EventSource (EVM logs | Solana notifications)
//!       │  normalize
//!       ▼
//! CandidateEvent
//!       │  Classifier (signature table)
//!       ▼
//! ClassifiedEvent ──► Dispatcher ──► Action ──► ActionSink
//! ```
//!
//! Sources, decode routines and the dispatcher live in the chain and stream
//! crates; this crate only defines the shapes that flow between them.

pub mod action;
pub mod chain;
pub mod classifier;
pub mod config;
pub mod error;
pub mod event;
pub mod source;

pub use action::{AccountUpdateAction, Action, BurnAction, DispatchContext, MintAction, TransferAction};
pub use chain::Network;
pub use classifier::{Classification, Classifier, SignatureTable};
pub use config::{PipelineConfig, TokenConfig};
pub use error::{ConfigError, DecodeError, DispatchError, SinkError};
pub use event::{AccountCandidate, AccountState, CandidateEvent, ClassifiedEvent, EventKind, LogCandidate};
pub use source::{CandidateStream, EventSource};
