//! `Pipeline`: source → classifier → dispatcher → sink.

use crate::dispatcher::Dispatcher;
use crate::error::PipelineError;
use crate::sink::ActionSink;
use chainactions_core::{
    CandidateEvent, Classifier, ConfigError, DispatchContext, DispatchError, EventKind, PipelineConfig,
};
use chrono::Utc;
use futures::{pin_mut, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

/// What happened to a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Published(EventKind),
    Ignored,
}

/// Counters snapshot for a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub published: u64,
    pub ignored: u64,
    pub decode_errors: u64,
    pub invariant_violations: u64,
}

#[derive(Default)]
struct Counters {
    published: AtomicU64,
    ignored: AtomicU64,
    decode_errors: AtomicU64,
    invariant_violations: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            published: self.published.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            invariant_violations: self.invariant_violations.load(Ordering::Relaxed),
        }
    }
}

pub struct Pipeline<S> {
    config: PipelineConfig,
    classifier: Classifier,
    sink: S,
    counters: Counters,
}

impl<S: ActionSink> Pipeline<S> {
    /// Build a pipeline over a validated configuration.
    pub fn new(config: PipelineConfig, classifier: Classifier, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            network = %config.network,
            topic = config.network.user_actions_topic(),
            signatures = classifier.table().len(),
            "pipeline ready"
        );
        Ok(Self {
            config,
            classifier,
            sink,
            counters: Counters::default(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot()
    }

    /// Classify, decode and publish one candidate.
    ///
    /// Decode errors and invariant violations are counted before being
    /// returned; sink failures are returned as-is and never retried.
    pub async fn process(&self, candidate: CandidateEvent) -> Result<Outcome, PipelineError> {
        let network = self.config.network;
        if matches!(candidate, CandidateEvent::Evm(_)) != network.is_evm() {
            warn!(
                network = %network,
                origin = candidate.origin(),
                "candidate origin does not match the pipeline network"
            );
            self.counters.ignored.fetch_add(1, Ordering::Relaxed);
            return Ok(Outcome::Ignored);
        }

        let Some(classified) = self.classifier.classify(candidate) else {
            self.counters.ignored.fetch_add(1, Ordering::Relaxed);
            return Ok(Outcome::Ignored);
        };
        let kind = classified.kind();

        let ctx = DispatchContext {
            network,
            token: self.config.token.clone(),
            observed_at: Utc::now(),
        };
        let action = Dispatcher::dispatch(classified, &ctx).map_err(|e| {
            self.record_dispatch_error(kind, &e);
            e
        })?;

        let topic = network.user_actions_topic();
        self.sink.publish(topic, &action).await.map_err(|e| {
            error!(kind = %kind, topic, error = %e, "failed to publish action");
            e
        })?;
        self.counters.published.fetch_add(1, Ordering::Relaxed);
        debug!(kind = %kind, topic, "published action");

        Ok(Outcome::Published(kind))
    }

    /// Process candidates in order until the stream ends or fails.
    pub async fn run<C, E>(&self, candidates: C) -> Result<PipelineStats, PipelineError>
    where
        C: Stream<Item = Result<CandidateEvent, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        pin_mut!(candidates);
        while let Some(item) = candidates.next().await {
            let candidate = item.map_err(|e| {
                error!(network = %self.config.network, error = %e, "candidate source failed");
                PipelineError::Source(Box::new(e))
            })?;

            match self.process(candidate).await {
                Ok(_) => {}
                Err(e) if e.is_recoverable() => {}
                Err(e) => return Err(e),
            }
        }

        let stats = self.stats();
        info!(
            network = %self.config.network,
            published = stats.published,
            ignored = stats.ignored,
            decode_errors = stats.decode_errors,
            invariant_violations = stats.invariant_violations,
            "candidate stream ended"
        );
        Ok(stats)
    }

    fn record_dispatch_error(&self, kind: EventKind, err: &DispatchError) {
        if err.is_internal() {
            self.counters.invariant_violations.fetch_add(1, Ordering::Relaxed);
            error!(kind = %kind, error = %err, "dispatch invariant violated");
        } else {
            self.counters.decode_errors.fetch_add(1, Ordering::Relaxed);
            warn!(kind = %kind, error = %err, "skipping undecodable event");
        }
    }
}
