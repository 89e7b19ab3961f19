//! # User Events
//!
//! Notification pipeline for user records: a keyed producer that publishes a
//! [`UserRecord`] to a single topic and a consumer that decodes every message
//! and hands it to a [`RecordHandler`].
//!
//! ## Architecture
//!
//! ```text
//! UserRecord → codec::encode → UserEventProducer → EventTransport → topic
//!                                                                     ↓
//!      RecordHandler ← codec::decode ← UserEventConsumer ← EventSource
//! ```
//!
//! The broker is reached only through the [`EventTransport`] and
//! [`EventSource`] traits. [`kafka`] provides the rdkafka implementations,
//! [`memory`] a process-local broker for tests and local runs.
//!
//! ## Guarantees
//!
//! - Every message is keyed by the record id, so same-key messages land on the
//!   same partition in send order.
//! - Publishing a record without an id fails with [`PublishError::MissingKey`]
//!   before the transport is touched.
//! - Delivery is at-least-once. A poison message or a failing handler is
//!   logged and skipped; only a transport failure stops the consumer.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use user_events::{memory::InMemoryBroker, LoggingHandler, UserEventConsumer, UserEventProducer, UserRecord};
//!
//! let broker = InMemoryBroker::new();
//! let producer = UserEventProducer::new(Arc::new(broker.clone()), "user-events");
//! let consumer = UserEventConsumer::new(broker.source("user-group"), Arc::new(LoggingHandler), "user-events");
//! let handle = consumer.start().await?;
//!
//! let record = UserRecord::new("Ana", "ana@example.com", None).with_id(42);
//! producer.publish(&record).await?;
//!
//! let report = handle.stop().await?;
//! ```

pub mod codec;
pub mod consumer;
pub mod error;
pub mod kafka;
pub mod memory;
pub mod metrics;
pub mod producer;
pub mod record;
pub mod topic;
pub mod transport;

pub use codec::{decode, encode};
pub use consumer::{
    ConsumerHandle, ConsumerReport, ConsumerState, LoggingHandler, RecordHandler,
    UserEventConsumer,
};
pub use error::{ConsumerError, DecodeError, EncodeError, PublishError, TopicError, TransportError};
pub use producer::{PublishResult, UserEventProducer};
pub use record::UserRecord;
pub use topic::{ensure_topic, TopicSpec, TopicStatus, USER_EVENTS_GROUP, USER_EVENTS_TOPIC};
pub use transport::{DeliveryReceipt, EventSource, EventTransport, ReceivedMessage};
