//! Keyed publisher for user notification events.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::codec;
use crate::error::{PublishError, TransportError};
use crate::metrics;
use crate::record::UserRecord;
use crate::transport::EventTransport;

const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// What a successful publish reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub topic: String,
    pub key: String,
    pub partition: i32,
    pub offset: i64,
    pub payload_bytes: usize,
}

/// Publishes user records to a single topic, keyed by record id.
///
/// Stateless per call and cheap to clone; concurrent calls only share the
/// transport. Calls are not serialised internally, so callers that need
/// same-key ordering must not publish the same key concurrently.
#[derive(Clone)]
pub struct UserEventProducer {
    transport: Arc<dyn EventTransport>,
    topic: String,
    timeout: Duration,
}

impl UserEventProducer {
    pub fn new(transport: Arc<dyn EventTransport>, topic: impl Into<String>) -> Self {
        Self {
            transport,
            topic: topic.into(),
            timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    /// Upper bound on how long a single publish may wait for the broker.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Encode `record` and send it under its id.
    ///
    /// A record without an id is rejected with [`PublishError::MissingKey`]
    /// before anything is sent. Transport failures are returned as-is and are
    /// not retried here.
    pub async fn publish(&self, record: &UserRecord) -> Result<PublishResult, PublishError> {
        let Some(key) = record.partition_key() else {
            error!(
                topic = %self.topic,
                email = %record.email,
                "Refusing to publish user event without id"
            );
            metrics::record_publish("missing_key");
            return Err(PublishError::MissingKey);
        };

        let payload = codec::encode(record).map_err(|e| {
            error!(topic = %self.topic, key = %key, error = %e, "Failed to encode user event");
            metrics::record_publish("encode_failed");
            PublishError::from(e)
        })?;

        debug!(topic = %self.topic, key = %key, "Publishing user event");

        let cause = match timeout(self.timeout, self.transport.send(&self.topic, &key, &payload))
            .await
        {
            Ok(Ok(receipt)) => {
                info!(
                    topic = %self.topic,
                    key = %key,
                    payload_bytes = payload.len(),
                    partition = receipt.partition,
                    offset = receipt.offset,
                    "Published user event"
                );
                metrics::record_publish("published");
                return Ok(PublishResult {
                    topic: self.topic.clone(),
                    key,
                    partition: receipt.partition,
                    offset: receipt.offset,
                    payload_bytes: payload.len(),
                });
            }
            Ok(Err(e)) => {
                error!(topic = %self.topic, key = %key, error = %e, "Failed to publish user event");
                e
            }
            Err(_) => {
                warn!(
                    topic = %self.topic,
                    key = %key,
                    "User event publish timed out after {:?}",
                    self.timeout
                );
                TransportError::Timeout(self.timeout)
            }
        };

        metrics::record_publish("transport_failed");
        Err(PublishError::TransportFailure { cause })
    }
}
