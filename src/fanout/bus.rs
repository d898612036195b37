use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::errors::BusError;

// ============================================================================
// Fanout Bus - cross-process publish/subscribe channel
// ============================================================================
//
// Every process publishes committed content on one shared channel and every
// process (the publisher included) receives it back. The bus moves opaque
// strings; the envelope below is the wire format on top of it.
//
// ============================================================================

/// Wire envelope: `{"origin": "<uuid>", "seq": 42, "content": {...}}`.
///
/// `origin`/`seq` may be absent on messages from older publishers, which
/// then bypass deduplication. Publishers that send bare content
/// (`{"t": ..., "wid": ...}`) are accepted the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    pub content: Value,
}

impl BusMessage {
    pub fn new(origin: Uuid, seq: u64, content: Value) -> Self {
        Self {
            origin: Some(origin),
            seq: Some(seq),
            content,
        }
    }

    pub fn encode(&self) -> Result<String, BusError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(payload: &str) -> Result<Self, BusError> {
        let value: Value = serde_json::from_str(payload)?;

        let bare = value.get("content").is_none()
            && (value.get("t").is_some() || value.get("wid").is_some());
        if bare {
            return Ok(Self {
                origin: None,
                seq: None,
                content: value,
            });
        }

        Ok(serde_json::from_value(value)?)
    }

    /// The whiteboard id the content is addressed to, if any.
    pub fn wid(&self) -> Option<&str> {
        self.content.get("wid").and_then(Value::as_str)
    }
}

#[async_trait]
pub trait FanoutBus: Send + Sync {
    async fn publish(&self, payload: String) -> Result<(), BusError>;

    /// Open a subscription. The stream ends when the connection drops.
    async fn subscribe(&self) -> Result<BoxStream<'static, String>, BusError>;
}

/// In-process bus for single-node deployments and tests.
#[derive(Clone)]
pub struct LocalBus {
    sender: broadcast::Sender<String>,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl FanoutBus for LocalBus {
    async fn publish(&self, payload: String) -> Result<(), BusError> {
        // No subscribers is not an error, same as PUBLISH to an empty channel
        let _ = self.sender.send(payload);
        Ok(())
    }

    async fn subscribe(&self) -> Result<BoxStream<'static, String>, BusError> {
        let receiver = self.sender.subscribe();

        let messages = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(payload) => return Some((payload, receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Local bus subscriber lagged, messages lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(messages.boxed())
    }
}
