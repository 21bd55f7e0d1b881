//! `chainactions evm` / `chainactions solana`: stream actions until Ctrl-C or
//! the feed ends.

use crate::config::AppConfig;
use crate::sink::{MeteredSink, StdoutSink};
use anyhow::{Context, Result};
use chainactions_core::{CandidateEvent, Classifier, EventSource, Network};
use chainactions_evm::{user_action_table, EvmLogListener, EvmLogSource};
use chainactions_observability::ActionMetrics;
use chainactions_solana::{SolanaAccountSource, SubscriptionManager};
use chainactions_stream::{Pipeline, PipelineError, PipelineStats};
use futures::Stream;
use tracing::{info, warn};

type CliPipeline = Pipeline<MeteredSink<StdoutSink>>;

fn build_pipeline(config: chainactions_core::PipelineConfig, metrics: &ActionMetrics) -> Result<CliPipeline> {
    let sink = MeteredSink::new(StdoutSink, metrics.clone());
    Ok(Pipeline::new(config, Classifier::new(user_action_table()), sink)?)
}

pub async fn evm(config: AppConfig) -> Result<()> {
    let pipeline_config = config.evm_pipeline()?;
    let listener_config = config.evm_listener()?;
    let filter = pipeline_config
        .filter_address
        .context("pipeline.filter_address is required for EVM networks")?;

    let metrics = ActionMetrics::global();
    let pipeline = build_pipeline(pipeline_config, &metrics)?;

    let listener = EvmLogListener::new(listener_config, filter);
    let logs = listener.subscribe().await.context("subscribing to EVM logs")?;
    let source = EvmLogSource::new(filter);
    let name = source.name();
    let candidates = source.candidates(logs);

    let result = run_until_interrupted(&pipeline, name, candidates).await;
    report(&pipeline, &metrics);
    result.context("EVM pipeline stopped")
}

pub async fn solana(config: AppConfig) -> Result<()> {
    let pipeline_config = config.solana_pipeline()?;
    let (ws_url, program_id) = config.solana_target()?;

    let metrics = ActionMetrics::global();
    let pipeline = build_pipeline(pipeline_config, &metrics)?;

    let manager = SubscriptionManager::new(ws_url, config.solana.subscription.clone());
    let (subscription, notifications) = manager
        .open(&program_id)
        .await
        .with_context(|| format!("subscribing to program {program_id}"))?;
    let source = SolanaAccountSource::new();
    let candidates = source.candidates(notifications);

    let result = run_until_interrupted(&pipeline, source.name(), candidates).await;
    if let Err(e) = subscription.close().await {
        warn!(error = %e, "program subscription did not close cleanly");
    }
    report(&pipeline, &metrics);
    result.context("Solana pipeline stopped")
}

async fn run_until_interrupted<C, E>(
    pipeline: &CliPipeline,
    source: &'static str,
    candidates: C,
) -> Result<(), PipelineError>
where
    C: Stream<Item = Result<CandidateEvent, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    info!(source, network = %pipeline.config().network, "streaming candidates");
    tokio::select! {
        result = pipeline.run(candidates) => result.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            info!(source, "interrupted, shutting down");
            Ok(())
        }
    }
}

fn report(pipeline: &CliPipeline, metrics: &ActionMetrics) {
    let network: Network = pipeline.config().network;
    let PipelineStats {
        published,
        ignored,
        decode_errors,
        invariant_violations,
    } = pipeline.stats();

    metrics.record_ignored(network, ignored);
    metrics.record_decode_errors(network, decode_errors);
    metrics.record_invariant_violations(network, invariant_violations);
    info!(
        network = %network,
        published,
        ignored,
        decode_errors,
        invariant_violations,
        "pipeline finished"
    );
}
