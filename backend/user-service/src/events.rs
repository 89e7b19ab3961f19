//! Wiring of the user event pipeline for the service process.
//!
//! With `KAFKA_ENABLED=true` the producer and consumer talk to Kafka; otherwise
//! both run over one in-process broker so `notify` still round-trips locally.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use user_events::kafka::{KafkaEventSource, KafkaTransport};
use user_events::memory::InMemoryBroker;
use user_events::{
    ensure_topic, ConsumerHandle, EventSource, LoggingHandler, TopicSpec, UserEventConsumer,
    UserEventProducer,
};

use crate::config::KafkaConfig;

const CLIENT_ID: &str = "user-service";

pub struct EventPipeline {
    producer: UserEventProducer,
    consumer: Option<ConsumerHandle>,
}

impl EventPipeline {
    /// Build the producer and, when enabled, start the logging consumer.
    ///
    /// Topic bootstrap and consumer start-up failures are logged and the
    /// service keeps running; only an invalid Kafka client configuration is
    /// fatal.
    pub async fn start(config: &KafkaConfig) -> anyhow::Result<Self> {
        if config.enabled {
            Self::start_kafka(config).await
        } else {
            info!("Kafka disabled; using in-process user events broker");
            Ok(Self::start_in_memory(&InMemoryBroker::new(), config).await)
        }
    }

    /// Run the pipeline over an existing in-process broker.
    pub async fn start_in_memory(broker: &InMemoryBroker, config: &KafkaConfig) -> Self {
        let producer = UserEventProducer::new(Arc::new(broker.clone()), config.topic.clone())
            .with_timeout(config.publish_timeout());

        let consumer = if config.consumer_enabled {
            start_consumer(broker.source(config.group_id.clone()), &config.topic).await
        } else {
            None
        };

        Self { producer, consumer }
    }

    async fn start_kafka(config: &KafkaConfig) -> anyhow::Result<Self> {
        if config.auto_create_topic {
            let spec = TopicSpec::new(config.topic.clone());
            if let Err(e) = ensure_topic(&config.brokers, &spec, config.publish_timeout()).await {
                warn!(topic = %config.topic, error = %e, "Failed to ensure user events topic");
            }
        }

        let transport = KafkaTransport::new(&config.brokers, CLIENT_ID, config.publish_timeout())
            .context("Failed to create Kafka producer")?;
        if let Err(e) = transport.health_check(&config.topic).await {
            warn!(brokers = %config.brokers, error = %e, "Kafka metadata check failed");
        }

        let producer = UserEventProducer::new(Arc::new(transport), config.topic.clone())
            .with_timeout(config.publish_timeout());

        let consumer = if config.consumer_enabled {
            match KafkaEventSource::new(&config.brokers, &config.group_id) {
                Ok(source) => start_consumer(source, &config.topic).await,
                Err(e) => {
                    error!(error = %e, "Failed to create Kafka consumer");
                    None
                }
            }
        } else {
            info!("User events consumer disabled");
            None
        };

        Ok(Self { producer, consumer })
    }

    pub fn producer(&self) -> UserEventProducer {
        self.producer.clone()
    }

    pub fn consumer(&self) -> Option<&ConsumerHandle> {
        self.consumer.as_ref()
    }

    /// Stop the consumer, if any, and wait for it to release its source.
    pub async fn shutdown(self) {
        let Some(handle) = self.consumer else {
            return;
        };

        let result = if handle.state().is_terminal() {
            handle.wait().await
        } else {
            handle.stop().await
        };

        match result {
            Ok(report) => info!(
                processed = report.processed,
                decode_failures = report.decode_failures,
                handler_failures = report.handler_failures,
                "User events consumer shut down"
            ),
            Err(e) => warn!(error = %e, "User events consumer ended with error"),
        }
    }
}

async fn start_consumer<S>(source: S, topic: &str) -> Option<ConsumerHandle>
where
    S: EventSource + 'static,
{
    match UserEventConsumer::new(source, Arc::new(LoggingHandler), topic)
        .start()
        .await
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            error!(error = %e, "User events consumer failed to start; notifications will not be consumed");
            None
        }
    }
}
