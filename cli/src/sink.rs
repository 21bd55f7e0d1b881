//! Sinks used by the CLI: JSON lines on stdout, with metrics recorded on the way.

use async_trait::async_trait;
use chainactions_core::{Action, SinkError};
use chainactions_observability::ActionMetrics;
use chainactions_stream::ActionSink;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct Line<'a> {
    topic: &'a str,
    action: &'a Action,
}

/// Writes one `{"topic":..,"action":..}` line per action.
#[derive(Debug, Default)]
pub struct StdoutSink;

/// Render the line a [`StdoutSink`] prints for `action`.
pub fn render_line(topic: &str, action: &Action) -> Result<String, SinkError> {
    Ok(serde_json::to_string(&Line { topic, action })?)
}

#[async_trait]
impl ActionSink for StdoutSink {
    async fn publish(&self, topic: &str, action: &Action) -> Result<(), SinkError> {
        let line = render_line(topic, action)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}").map_err(|e| SinkError::Rejected(e.to_string()))
    }
}

/// Counts successful publishes of the wrapped sink.
pub struct MeteredSink<S> {
    inner: S,
    metrics: ActionMetrics,
}

impl<S> MeteredSink<S> {
    pub fn new(inner: S, metrics: ActionMetrics) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl<S: ActionSink> ActionSink for MeteredSink<S> {
    async fn publish(&self, topic: &str, action: &Action) -> Result<(), SinkError> {
        self.inner.publish(topic, action).await?;
        self.metrics.record_published(action.network(), action.kind());
        Ok(())
    }
}
