//! `EventSource` trait: abstraction over the origin feeds.
//!
//! Each feed implements `normalize` for its raw item type and provides a
//! stream adapter producing a [`CandidateStream`]. Rejected items never reach
//! the classifier.

use crate::event::CandidateEvent;
use futures::Stream;
use std::pin::Pin;

/// A stream of candidates from one feed. `Err` items are terminal feed errors.
pub type CandidateStream<E> = Pin<Box<dyn Stream<Item = Result<CandidateEvent, E>> + Send>>;

/// Normalizes one raw feed item into a [`CandidateEvent`].
pub trait EventSource: Send + Sync {
    type Raw;

    /// Short label for logs, e.g. `"evm"`.
    fn name(&self) -> &'static str;

    /// Returns `None` when the item is filtered out.
    fn normalize(&self, raw: Self::Raw) -> Option<CandidateEvent>;
}
