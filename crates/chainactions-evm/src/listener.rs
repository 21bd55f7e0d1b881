//! `EvmLogListener`: `eth_subscribe("logs", {address})` over a websocket.
//!
//! # Usage
//! ```no_run
//! # async fn example() -> Result<(), chainactions_evm::ListenerError> {
//! use chainactions_evm::{EvmLogListener, ListenerConfig};
//! use alloy_primitives::Address;
//!
//! let listener = EvmLogListener::new(
//!     ListenerConfig::new("wss://mainnet.infura.io/ws/v3/YOUR_KEY"),
//!     Address::ZERO,
//! );
//! let logs = listener.subscribe().await?;
//! # Ok(()) }
//! ```
//!
//! The feed ends on the first transport error or peer close; reconnecting is
//! left to the caller.

use crate::error::ListenerError;
use crate::source::EvmLog;
use alloy_primitives::Address;
use futures::{channel::mpsc, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// A stream of logs from a single contract.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<EvmLog, ListenerError>> + Send>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// WebSocket RPC endpoint (`ws://` or `wss://`)
    pub ws_url: String,
    /// Buffered logs between the socket task and the consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize { 512 }

impl ListenerConfig {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

pub struct EvmLogListener {
    config: ListenerConfig,
    filter_address: Address,
    connected: Arc<AtomicBool>,
}

impl EvmLogListener {
    pub fn new(config: ListenerConfig, filter_address: Address) -> Self {
        Self {
            config,
            filter_address,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Connect, send the subscription and start streaming logs.
    /// Dial failures are returned here; later failures arrive on the stream.
    pub async fn subscribe(&self) -> Result<LogStream, ListenerError> {
        let url = self.config.ws_url.clone();
        info!(url = %url, "connecting to EVM websocket");

        let (ws_stream, _) = connect_async(&url).await.map_err(|e| {
            error!(url = %url, error = %e, "websocket connect failed");
            ListenerError::ConnectionFailed {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;
        self.connected.store(true, Ordering::Relaxed);

        let (mut write, mut read) = ws_stream.split();

        let sub_msg = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_subscribe",
            "params": ["logs", { "address": self.filter_address }]
        });
        if let Err(e) = write.send(Message::Text(sub_msg.to_string())).await {
            self.connected.store(false, Ordering::Relaxed);
            return Err(e.into());
        }

        let (mut tx, rx) = mpsc::channel::<Result<EvmLog, ListenerError>>(self.config.channel_capacity);
        let connected = Arc::clone(&self.connected);

        tokio::spawn(async move {
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Err(e) => {
                        warn!(error = %e, "EVM websocket error");
                        let _ = tx.send(Err(e.into())).await;
                        break;
                    }
                    Ok(Message::Text(text)) => {
                        debug!(frame = %text.chars().take(120).collect::<String>(), "EVM websocket frame");
                        let Some(item) = parse_log_message(&text) else {
                            continue;
                        };
                        let fatal = item.is_err();
                        if tx.send(item).await.is_err() || fatal {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("EVM websocket closed by server");
                        let _ = tx.send(Err(ListenerError::Closed)).await;
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Ok(_) => {}
                }
            }

            connected.store(false, Ordering::Relaxed);
            info!("EVM log subscription ended");
        });

        Ok(Box::pin(rx))
    }
}

/// Interpret one text frame of an `eth_subscribe("logs")` connection.
///
/// Returns `None` for the subscription confirmation and for logs removed by a
/// reorg; a rejected subscription or an undecodable log is an error.
fn parse_log_message(text: &str) -> Option<Result<EvmLog, ListenerError>> {
    let mut v: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return Some(Err(e.into())),
    };

    if let Some(err) = v.get("error").filter(|e| !e.is_null()) {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Some(Err(ListenerError::SubscribeRejected(message)));
    }

    if v.get("method").and_then(Value::as_str) != Some("eth_subscription") {
        return None;
    }

    let result = v.get_mut("params")?.get_mut("result")?.take();
    match serde_json::from_value::<EvmLog>(result) {
        Ok(log) if log.removed => {
            debug!(tx = %log.transaction_hash, "skipping removed log");
            None
        }
        Ok(log) => Some(Ok(log)),
        Err(e) => Some(Err(e.into())),
    }
}
