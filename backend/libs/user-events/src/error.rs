//! Error types for the user event pipeline

use std::time::Duration;
use thiserror::Error;

/// Serializer failure while encoding a record.
#[derive(Debug, Error)]
#[error("failed to encode user record: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// A payload that could not be turned back into a user record.
///
/// Carries the raw input (lossy UTF-8) so the consumer can log the poison
/// message as received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to decode user record: {reason}")]
pub struct DecodeError {
    pub reason: String,
    pub raw_input: String,
}

impl DecodeError {
    pub fn new(reason: impl Into<String>, raw: &[u8]) -> Self {
        Self {
            reason: reason.into(),
            raw_input: String::from_utf8_lossy(raw).into_owned(),
        }
    }
}

/// Broker-level failure (unreachable, send/receive error, timeout).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors returned by [`crate::UserEventProducer::publish`].
#[derive(Debug, Error)]
pub enum PublishError {
    /// The record has no id, so there is no partition key to publish under.
    #[error("user record has no id; cannot publish without a partition key")]
    MissingKey,

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The broker could not be reached or rejected the send. Not retried.
    #[error("failed to deliver user event: {cause}")]
    TransportFailure {
        #[source]
        cause: TransportError,
    },
}

impl From<TransportError> for PublishError {
    fn from(cause: TransportError) -> Self {
        PublishError::TransportFailure { cause }
    }
}

/// Errors that end a consumer instance.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Subscribing failed, typically because the broker is unreachable at startup.
    #[error("failed to subscribe to topic '{topic}': {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: TransportError,
    },

    /// The receive loop hit a transport error and the consumer is faulted.
    #[error("consumer receive loop failed: {0}")]
    Transport(#[source] TransportError),

    /// The consumer task itself was cancelled or panicked.
    #[error("consumer task aborted: {0}")]
    Aborted(String),
}

/// Errors from topic administration.
#[derive(Debug, Error)]
pub enum TopicError {
    #[error("Kafka admin error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("broker rejected topic '{topic}': {code}")]
    Rejected { topic: String, code: String },
}
