//! rdkafka-backed transport and source.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::consumer::DefaultConsumerContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use tracing::info;

use crate::error::TransportError;
use crate::transport::{DeliveryReceipt, EventSource, EventTransport, ReceivedMessage};

const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka producer for user events
///
/// Configuration ensures:
/// - `acks = all`: the leader waits for the full ISR before acknowledging
/// - `enable.idempotence = true` with `max.in.flight.requests.per.connection = 5`:
///   retries inside librdkafka cannot reorder or duplicate same-partition sends
/// - `message.timeout.ms`: bounds local queueing plus delivery
///
/// `FutureProducer` is internally reference counted, so clones share one
/// connection and can be used from every request handler.
#[derive(Clone)]
pub struct KafkaTransport {
    producer: FutureProducer,
    queue_timeout: Duration,
}

impl KafkaTransport {
    pub fn new(
        brokers: &str,
        client_id: &str,
        delivery_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("client.id", client_id)
            .set("message.timeout.ms", delivery_timeout.as_millis().to_string())
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("max.in.flight.requests.per.connection", "5")
            .set("compression.type", "lz4")
            .set("linger.ms", "5")
            .create()?;

        info!(brokers = %brokers, client_id = %client_id, "Kafka producer created");

        Ok(Self {
            producer,
            queue_timeout: delivery_timeout,
        })
    }

    /// Lightweight health check by fetching topic metadata
    pub async fn health_check(&self, topic: &str) -> Result<(), TransportError> {
        let producer = self.producer.clone();
        let topic = topic.to_owned();

        // librdkafka performs metadata fetch synchronously
        tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(Some(topic.as_str()), METADATA_TIMEOUT)
                .map(|_| ())
                .map_err(TransportError::from)
        })
        .await
        .map_err(|e| TransportError::Unavailable(format!("metadata task failed: {}", e)))?
    }
}

#[async_trait]
impl EventTransport for KafkaTransport {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
    ) -> Result<DeliveryReceipt, TransportError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        self.producer
            .send(record, self.queue_timeout)
            .await
            .map(|(partition, offset)| DeliveryReceipt { partition, offset })
            .map_err(|(e, _)| TransportError::Kafka(e))
    }
}

/// Kafka consumer for user events under one consumer group.
///
/// Offsets are auto-committed, so delivery is at-least-once: messages between
/// the last commit and a restart are delivered again.
pub struct KafkaEventSource {
    consumer: StreamConsumer,
    brokers: String,
    group_id: String,
}

impl KafkaEventSource {
    pub fn new(brokers: &str, group_id: &str) -> Result<Self, TransportError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "30000")
            .set("enable.partition.eof", "false")
            .create()?;

        Ok(Self {
            consumer,
            brokers: brokers.to_owned(),
            group_id: group_id.to_owned(),
        })
    }
}

#[async_trait]
impl EventSource for KafkaEventSource {
    fn group_id(&self) -> &str {
        &self.group_id
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        // librdkafka subscribe never fails on an unreachable cluster; check metadata first.
        let brokers = self.brokers.clone();
        tokio::task::spawn_blocking(move || -> Result<(), TransportError> {
            let checker: BaseConsumer<DefaultConsumerContext> = ClientConfig::new()
                .set("bootstrap.servers", &brokers)
                .create()?;
            let metadata = checker.fetch_metadata(None, METADATA_TIMEOUT)?;
            if metadata.brokers().is_empty() {
                return Err(TransportError::Unavailable(
                    "no Kafka brokers available".into(),
                ));
            }
            Ok(())
        })
        .await
        .map_err(|e| TransportError::Unavailable(format!("metadata task failed: {}", e)))??;

        self.consumer.subscribe(&[topic])?;
        info!(topic = %topic, group_id = %self.group_id, "Subscribed to Kafka topic");
        Ok(())
    }

    async fn recv(&mut self) -> Result<ReceivedMessage, TransportError> {
        let message = self.consumer.recv().await?;

        Ok(ReceivedMessage {
            key: message.key().map(|k| String::from_utf8_lossy(k).into_owned()),
            payload: message.payload().map(<[u8]>::to_vec),
            partition: message.partition(),
            offset: message.offset(),
        })
    }

    async fn close(&mut self) {
        // Dropping the consumer afterwards closes it and commits the final offsets.
        self.consumer.unsubscribe();
        info!(group_id = %self.group_id, "Unsubscribed Kafka consumer");
    }
}
