//! Error types for the ChainActions pipeline.
//!
//! Filtered-out input (wrong address, too few topics, unknown signature) is
//! never an error and has no variant here.

use crate::event::EventKind;
use thiserror::Error;

/// A single classified item whose payload does not match the shape its kind
/// requires. Recoverable: the pipeline skips the item and continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{kind} event is missing topic #{index}")]
    MissingTopic { kind: EventKind, index: usize },

    #[error("Invalid length for {field}: expected {expected} bytes, got {got}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Invalid {field} encoding: {reason}")]
    InvalidEncoding { field: &'static str, reason: String },

    #[error("Unsupported account data encoding: {0}")]
    UnsupportedEncoding(String),
}

/// Errors returned by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The classifier produced a kind the dispatcher has no routine for on
    /// this origin. This is a broken classifier/dispatcher pairing, not bad
    /// input.
    #[error("Internal invariant violated: no dispatch route for {kind} on a {origin} event")]
    Invariant { kind: EventKind, origin: &'static str },
}

impl DispatchError {
    /// Returns `true` for classifier/dispatcher pairing failures.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Invariant { .. })
    }
}

/// Errors from the downstream publish sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink closed")]
    Closed,

    #[error("Sink rejected action: {0}")]
    Rejected(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while building the immutable pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
