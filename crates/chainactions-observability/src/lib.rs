//! # chainactions-observability
//!
//! OpenTelemetry-based observability for ChainActions.
//!
//! ## Built-in metrics
//! - `chainactions.actions_published`    — counter, tagged with network + kind
//! - `chainactions.events_ignored`       — counter, tagged with network
//! - `chainactions.decode_errors`        — counter, tagged with network
//! - `chainactions.invariant_violations` — counter, tagged with network
//!
//! ## Structured logging
//! Text or JSON logs, with levels configurable per component.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::ActionMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
