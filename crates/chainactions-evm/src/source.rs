//! EVM log source.
//!
//! Accepts only logs emitted by the configured contract that carry at least
//! a signature word and one indexed parameter. Everything else is dropped
//! silently (debug log only) before classification.

use alloy_primitives::{Address, Bytes, B256, U64};
use chainactions_core::{CandidateEvent, CandidateStream, EventSource, LogCandidate};
use futures::{future, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Logs with fewer topics than this never reach the classifier.
pub const MIN_TOPICS: usize = 2;

/// An EVM log as delivered by `eth_getLogs` / `eth_subscribe("logs")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmLog {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    pub transaction_hash: B256,
    pub log_index: U64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<U64>,
    /// Set by the node when a reorg drops the log
    #[serde(default)]
    pub removed: bool,
}

/// Normalizes [`EvmLog`]s from a single contract into candidates.
#[derive(Debug, Clone)]
pub struct EvmLogSource {
    filter_address: Address,
}

impl EvmLogSource {
    pub fn new(filter_address: Address) -> Self {
        Self { filter_address }
    }

    pub fn filter_address(&self) -> Address {
        self.filter_address
    }

    /// Adapt a log stream into a candidate stream, dropping rejected logs.
    /// Feed errors pass through unchanged.
    pub fn candidates<S, E>(self, logs: S) -> CandidateStream<E>
    where
        S: Stream<Item = Result<EvmLog, E>> + Send + 'static,
        E: Send + 'static,
    {
        Box::pin(logs.filter_map(move |item| {
            let candidate = match item {
                Ok(log) => self.normalize(log).map(Ok),
                Err(e) => Some(Err(e)),
            };
            future::ready(candidate)
        }))
    }
}

impl EventSource for EvmLogSource {
    type Raw = EvmLog;

    fn name(&self) -> &'static str {
        "evm"
    }

    fn normalize(&self, log: EvmLog) -> Option<CandidateEvent> {
        if log.address != self.filter_address {
            debug!(
                address = %log.address,
                expected = %self.filter_address,
                "dropping log from another contract"
            );
            return None;
        }

        if log.topics.len() < MIN_TOPICS {
            debug!(
                topics = log.topics.len(),
                tx = %log.transaction_hash,
                "dropping log with too few topics"
            );
            return None;
        }

        let mut topics = log.topics.into_iter();
        let signature = topics.next()?;

        Some(CandidateEvent::Evm(LogCandidate {
            address: log.address,
            signature,
            topics: topics.collect(),
            data: log.data,
            transaction_hash: log.transaction_hash,
            log_index: log.log_index.to::<u64>(),
            block_number: log.block_number.map(|n| n.to::<u64>()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    const FILTER: Address = Address::new([0xf1; 20]);

    fn log(address: Address, topics: Vec<B256>) -> EvmLog {
        EvmLog {
            address,
            topics,
            data: Bytes::from(vec![0u8; 32]),
            transaction_hash: B256::repeat_byte(0xab),
            log_index: U64::from(3),
            block_number: Some(U64::from(0x1234)),
            removed: false,
        }
    }

    #[test]
    fn source_is_labelled_evm() {
        assert_eq!(EvmLogSource::new(FILTER).name(), "evm");
    }

    #[test]
    fn keeps_signature_and_remaining_topics() {
        let source = EvmLogSource::new(FILTER);
        let topics = vec![
            B256::repeat_byte(1),
            B256::repeat_byte(2),
            B256::repeat_byte(3),
        ];
        let Some(CandidateEvent::Evm(candidate)) = source.normalize(log(FILTER, topics)) else {
            panic!("expected an EVM candidate");
        };
        assert_eq!(candidate.signature, B256::repeat_byte(1));
        assert_eq!(candidate.topics, vec![B256::repeat_byte(2), B256::repeat_byte(3)]);
        assert_eq!(candidate.log_index, 3);
        assert_eq!(candidate.block_number, Some(0x1234));
    }

    #[test]
    fn rejects_other_contracts_regardless_of_content() {
        let source = EvmLogSource::new(FILTER);
        let other = Address::repeat_byte(0x0e);
        for topics in [
            vec![B256::repeat_byte(1), B256::repeat_byte(2)],
            vec![B256::repeat_byte(1), B256::repeat_byte(2), B256::repeat_byte(3)],
            vec![],
        ] {
            assert!(source.normalize(log(other, topics)).is_none());
        }
    }

    #[test]
    fn rejects_logs_with_fewer_than_two_topics() {
        let source = EvmLogSource::new(FILTER);
        assert!(source.normalize(log(FILTER, vec![])).is_none());
        assert!(source.normalize(log(FILTER, vec![B256::repeat_byte(1)])).is_none());
        assert!(source
            .normalize(log(FILTER, vec![B256::repeat_byte(1), B256::ZERO]))
            .is_some());
    }

    #[test]
    fn parses_rpc_log_json() {
        let json = r#"{
            "address":"0xf1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1f1",
            "topics":[
                "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
                "0x000000000000000000000000000000000000000000000000000000000000000a"
            ],
            "data":"0x01",
            "blockNumber":"0x10",
            "transactionHash":"0xabababababababababababababababababababababababababababababababab",
            "logIndex":"0x2",
            "removed":false
        }"#;
        let parsed: EvmLog = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.address, FILTER);
        assert_eq!(parsed.topics.len(), 2);
        assert_eq!(parsed.log_index, U64::from(2));
        assert_eq!(parsed.data, Bytes::from(vec![1u8]));
    }

    #[tokio::test]
    async fn candidate_stream_drops_rejected_and_passes_errors() {
        let source = EvmLogSource::new(FILTER);
        let two = vec![B256::repeat_byte(1), B256::repeat_byte(2)];
        let items: Vec<Result<EvmLog, &'static str>> = vec![
            Ok(log(FILTER, two.clone())),
            Ok(log(Address::ZERO, two.clone())),
            Ok(log(FILTER, vec![B256::repeat_byte(1)])),
            Err("feed closed"),
        ];

        let out: Vec<_> = source.candidates(stream::iter(items)).collect().await;
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        assert_eq!(out[1].as_ref().unwrap_err(), &"feed closed");
    }
}
