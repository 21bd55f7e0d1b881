//! Downstream publishing.

use async_trait::async_trait;
use chainactions_core::{Action, SinkError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Where accepted actions go, keyed by the network's fixed topic.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn publish(&self, topic: &str, action: &Action) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: ActionSink + ?Sized> ActionSink for Arc<T> {
    async fn publish(&self, topic: &str, action: &Action) -> Result<(), SinkError> {
        (**self).publish(topic, action).await
    }
}

/// An action together with the topic it was published on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Published {
    pub topic: String,
    pub action: Action,
}

/// Forwards published actions over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Published>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Published>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ActionSink for ChannelSink {
    async fn publish(&self, topic: &str, action: &Action) -> Result<(), SinkError> {
        self.tx
            .send(Published {
                topic: topic.to_string(),
                action: action.clone(),
            })
            .await
            .map_err(|_| SinkError::Closed)
    }
}
