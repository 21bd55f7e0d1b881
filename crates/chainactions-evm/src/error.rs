use thiserror::Error;

/// Errors from the EVM websocket log feed. All are terminal for the feed.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("WebSocket connection failed: {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("eth_subscribe rejected: {0}")]
    SubscribeRejected(String),

    #[error("WebSocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Malformed log notification: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Log stream closed by peer")]
    Closed,
}
