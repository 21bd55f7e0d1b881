use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failures of a Solana program subscription, from dial to teardown.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("WebSocket connection failed: {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("WebSocket connect timed out after {ms}ms")]
    ConnectTimeout { ms: u64 },

    #[error("Subscription rejected by node ({code}): {message}")]
    Handshake { code: i64, message: String },

    #[error("No subscription acknowledgement within {ms}ms")]
    HandshakeTimeout { ms: u64 },

    #[error("Acknowledgement id {got} does not match request id {expected}")]
    Uncorrelated { expected: String, got: String },

    #[error("Malformed subscription acknowledgement: {0}")]
    MalformedAck(String),

    #[error("Failed to decode notification: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("Connection closed by peer")]
    Closed,

    #[error("Connection did not shut down within {ms}ms")]
    CloseTimeout { ms: u64 },

    #[error("Subscription task failed: {0}")]
    Task(String),
}

impl SubscriptionError {
    /// Errors raised before the subscription was established.
    pub fn is_handshake(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::ConnectTimeout { .. }
                | Self::Handshake { .. }
                | Self::HandshakeTimeout { .. }
                | Self::Uncorrelated { .. }
                | Self::MalformedAck(_)
        )
    }
}
