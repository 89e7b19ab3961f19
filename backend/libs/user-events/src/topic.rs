//! Topic and consumer-group identity for user events, plus topic bootstrap.

use std::time::Duration;

use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::types::RDKafkaErrorCode;
use tracing::info;

use crate::error::TopicError;

pub const USER_EVENTS_TOPIC: &str = "user-events";
pub const USER_EVENTS_GROUP: &str = "user-group";

/// Single partition keeps same-key ordering trivially; raising it keeps
/// per-key ordering only as long as keys hash consistently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
}

impl TopicSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: 1,
            replication_factor: 1,
        }
    }

    pub fn user_events() -> Self {
        Self::new(USER_EVENTS_TOPIC)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicStatus {
    Created,
    AlreadyExists,
}

/// Create the topic if it does not exist yet.
pub async fn ensure_topic(
    brokers: &str,
    spec: &TopicSpec,
    timeout: Duration,
) -> Result<TopicStatus, TopicError> {
    let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .set("request.timeout.ms", timeout.as_millis().to_string())
        .create()?;

    let topic = NewTopic::new(
        &spec.name,
        spec.partitions,
        TopicReplication::Fixed(spec.replication_factor),
    );
    let options = AdminOptions::new().operation_timeout(Some(timeout));

    let results = admin.create_topics(&[topic], &options).await?;

    match results.into_iter().next() {
        Some(Ok(name)) => {
            info!(
                topic = %name,
                partitions = spec.partitions,
                replication_factor = spec.replication_factor,
                "Created Kafka topic"
            );
            Ok(TopicStatus::Created)
        }
        Some(Err((name, RDKafkaErrorCode::TopicAlreadyExists))) => {
            info!(topic = %name, "Kafka topic already exists");
            Ok(TopicStatus::AlreadyExists)
        }
        Some(Err((name, code))) => Err(TopicError::Rejected {
            topic: name,
            code: code.to_string(),
        }),
        None => Err(TopicError::Rejected {
            topic: spec.name.clone(),
            code: "no result returned by broker".into(),
        }),
    }
}
