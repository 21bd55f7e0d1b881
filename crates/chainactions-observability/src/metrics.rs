//! ChainActions metrics definitions.
//!
//! All metrics use OpenTelemetry conventions. Without an installed meter
//! provider they are no-ops.

use chainactions_core::{EventKind, Network};
use opentelemetry::{
    global,
    metrics::{Counter, Meter},
    KeyValue,
};

/// Central metrics handle for a pipeline run.
#[derive(Clone)]
pub struct ActionMetrics {
    pub actions_published: Counter<u64>,
    pub events_ignored: Counter<u64>,
    pub decode_errors: Counter<u64>,
    pub invariant_violations: Counter<u64>,
}

impl ActionMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            actions_published: meter
                .u64_counter("chainactions.actions_published")
                .with_description("Actions decoded and handed to the sink")
                .build(),
            events_ignored: meter
                .u64_counter("chainactions.events_ignored")
                .with_description("Candidates with no applicable event kind")
                .build(),
            decode_errors: meter
                .u64_counter("chainactions.decode_errors")
                .with_description("Classified events whose payload failed to decode")
                .build(),
            invariant_violations: meter
                .u64_counter("chainactions.invariant_violations")
                .with_description("Classified events with no dispatch route")
                .build(),
        }
    }

    /// Metrics on the global meter provider.
    pub fn global() -> Self {
        Self::new(&global::meter("chainactions"))
    }

    pub fn record_published(&self, network: Network, kind: EventKind) {
        self.actions_published.add(
            1,
            &[
                KeyValue::new("network", network.as_str()),
                KeyValue::new("kind", kind.as_str()),
            ],
        );
    }

    pub fn record_ignored(&self, network: Network, count: u64) {
        self.events_ignored
            .add(count, &[KeyValue::new("network", network.as_str())]);
    }

    pub fn record_decode_errors(&self, network: Network, count: u64) {
        self.decode_errors
            .add(count, &[KeyValue::new("network", network.as_str())]);
    }

    pub fn record_invariant_violations(&self, network: Network, count: u64) {
        self.invariant_violations
            .add(count, &[KeyValue::new("network", network.as_str())]);
    }
}
