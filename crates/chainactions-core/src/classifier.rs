//! Signature classification.
//!
//! EVM candidates are looked up by their first topic word in a fixed
//! [`SignatureTable`]. Solana program notifications have a single shape, so
//! they always classify as [`EventKind::AccountUpdate`].

use crate::event::{CandidateEvent, ClassifiedEvent, EventKind};
use alloy_primitives::B256;
use std::collections::HashMap;
use tracing::debug;

/// Result of looking up a signature word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Kind(EventKind),
    NotApplicable,
}

/// Fixed map from signature word to event kind.
#[derive(Debug, Clone, Default)]
pub struct SignatureTable {
    entries: HashMap<B256, EventKind>,
}

impl SignatureTable {
    pub fn new(entries: impl IntoIterator<Item = (B256, EventKind)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Pure lookup. A miss is `NotApplicable`, never an error.
    pub fn classify(&self, signature: &B256) -> Classification {
        match self.entries.get(signature) {
            Some(kind) => Classification::Kind(*kind),
            None => Classification::NotApplicable,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&B256, &EventKind)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tags candidates with an [`EventKind`].
#[derive(Debug, Clone)]
pub struct Classifier {
    table: SignatureTable,
}

impl Classifier {
    pub fn new(table: SignatureTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SignatureTable {
        &self.table
    }

    /// Returns `None` when the candidate is not applicable; the caller drops it.
    pub fn classify(&self, candidate: CandidateEvent) -> Option<ClassifiedEvent> {
        let kind = match &candidate {
            CandidateEvent::Evm(log) => match self.table.classify(&log.signature) {
                Classification::Kind(kind) => kind,
                Classification::NotApplicable => {
                    debug!(signature = %log.signature, "no known event for signature");
                    return None;
                }
            },
            CandidateEvent::Solana(_) => EventKind::AccountUpdate,
        };
        Some(ClassifiedEvent::new(kind, candidate))
    }
}
