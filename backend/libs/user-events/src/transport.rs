//! Broker seams used by the producer and the consumer.

use async_trait::async_trait;

use crate::error::TransportError;

/// Where a published message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub partition: i32,
    pub offset: i64,
}

/// A message as handed to the consumer, detached from the broker client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub key: Option<String>,
    pub payload: Option<Vec<u8>>,
    pub partition: i32,
    pub offset: i64,
}

/// Sends keyed payloads to a topic. Shared across request handlers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
    ) -> Result<DeliveryReceipt, TransportError>;
}

/// Receives messages for one consumer group. Owned by a single consumer task.
#[async_trait]
pub trait EventSource: Send {
    /// Consumer group this source reads under.
    fn group_id(&self) -> &str;

    /// Join the group for `topic`. Fails when the broker cannot be reached.
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Wait for the next message. Must be cancel-safe: dropping the future
    /// before it resolves must not lose a message.
    async fn recv(&mut self) -> Result<ReceivedMessage, TransportError>;

    /// Leave the group and release the connection.
    async fn close(&mut self) {}
}
