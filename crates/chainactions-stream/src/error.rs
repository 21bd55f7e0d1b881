use chainactions_core::{DispatchError, SinkError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The candidate source failed; the run cannot continue.
    #[error("Candidate source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Publish failed: {0}")]
    Sink(#[from] SinkError),
}

impl PipelineError {
    /// Per-item failures the run skips over.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Dispatch(_))
    }
}
