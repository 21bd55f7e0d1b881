//! # chainactions-stream
//!
//! Turns candidate streams into published actions:
//!
//! ```text
//! CandidateStream ──► Classifier ──► Dispatcher ──► ActionSink
//! ```
//!
//! [`Pipeline`] drives the whole chain one candidate at a time. Filtered and
//! unknown items are counted as ignored; decode errors and invariant
//! violations are counted and skipped; source and sink failures end the run.

pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod sink;

pub use dispatcher::Dispatcher;
pub use error::PipelineError;
pub use pipeline::{Outcome, Pipeline, PipelineStats};
pub use sink::{ActionSink, ChannelSink, Published};
