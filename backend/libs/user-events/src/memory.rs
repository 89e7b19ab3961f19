//! Process-local broker with one ordered partition per topic.
//!
//! Implements [`EventTransport`] directly and hands out [`EventSource`]s per
//! consumer group. Group offsets are committed on delivery, so a new source
//! for the same group resumes where the previous one stopped. Used by tests
//! and by local runs without Kafka; it also exposes fault injection hooks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{DeliveryReceipt, EventSource, EventTransport, ReceivedMessage};

const PARTITION: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub offset: i64,
}

#[derive(Default)]
struct Log {
    topics: HashMap<String, Vec<StoredMessage>>,
    // (topic, group) -> next offset to deliver
    committed: HashMap<(String, String), usize>,
}

#[derive(Default)]
struct BrokerInner {
    log: Mutex<Log>,
    appended: Notify,
    send_calls: AtomicUsize,
    fail_sends: AtomicBool,
    unreachable: AtomicBool,
    closed: AtomicBool,
}

#[derive(Clone, Default)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A consumer-side handle reading under `group_id`.
    pub fn source(&self, group_id: impl Into<String>) -> InMemorySource {
        InMemorySource {
            broker: self.clone(),
            group_id: group_id.into(),
            topic: None,
        }
    }

    /// Append raw bytes, bypassing the codec. Returns the offset.
    pub fn inject(&self, topic: &str, key: Option<&str>, payload: &[u8]) -> i64 {
        self.append(topic, key.map(str::to_owned), payload.to_vec())
    }

    pub fn messages(&self, topic: &str) -> Vec<StoredMessage> {
        self.lock()
            .topics
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `send` calls made through the transport, failed ones included.
    pub fn send_calls(&self) -> usize {
        self.inner.send_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent send fail with a transport error.
    pub fn set_fail_sends(&self, fail: bool) {
        self.inner.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make sends and subscribes fail as if the broker could not be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Shut the broker down: pending and future receives fail.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.appended.notify_waiters();
    }

    fn append(&self, topic: &str, key: Option<String>, payload: Vec<u8>) -> i64 {
        let offset = {
            let mut log = self.lock();
            let partition = log.topics.entry(topic.to_owned()).or_default();
            let offset = partition.len() as i64;
            partition.push(StoredMessage {
                key,
                payload,
                offset,
            });
            offset
        };
        self.inner.appended.notify_waiters();
        offset
    }

    fn next_for(&self, topic: &str, group_id: &str) -> Option<StoredMessage> {
        let mut log = self.lock();
        let cursor_key = (topic.to_owned(), group_id.to_owned());
        let cursor = log.committed.get(&cursor_key).copied().unwrap_or(0);
        let message = log.topics.get(topic)?.get(cursor)?.clone();
        log.committed.insert(cursor_key, cursor + 1);
        Some(message)
    }

    fn unavailable(&self) -> Option<TransportError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            Some(TransportError::Unavailable("broker closed".into()))
        } else if self.inner.unreachable.load(Ordering::SeqCst) {
            Some(TransportError::Unavailable("broker unreachable".into()))
        } else {
            None
        }
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.inner
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EventTransport for InMemoryBroker {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
    ) -> Result<DeliveryReceipt, TransportError> {
        self.inner.send_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(e) = self.unavailable() {
            return Err(e);
        }
        if self.inner.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("send rejected".into()));
        }

        let offset = self.append(topic, Some(key.to_owned()), payload.to_vec());
        debug!(topic, key, offset, "Appended message to in-memory topic");
        Ok(DeliveryReceipt {
            partition: PARTITION,
            offset,
        })
    }
}

pub struct InMemorySource {
    broker: InMemoryBroker,
    group_id: String,
    topic: Option<String>,
}

#[async_trait]
impl EventSource for InMemorySource {
    fn group_id(&self) -> &str {
        &self.group_id
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if let Some(e) = self.broker.unavailable() {
            return Err(e);
        }
        self.topic = Some(topic.to_owned());
        Ok(())
    }

    async fn recv(&mut self) -> Result<ReceivedMessage, TransportError> {
        let topic = self
            .topic
            .clone()
            .ok_or_else(|| TransportError::Unavailable("source is not subscribed".into()))?;

        loop {
            // Registered before checking the log so an append in between is not missed.
            let appended = self.broker.inner.appended.notified();

            if self.broker.inner.closed.load(Ordering::SeqCst) {
                return Err(TransportError::Unavailable("broker closed".into()));
            }
            if let Some(message) = self.broker.next_for(&topic, &self.group_id) {
                return Ok(ReceivedMessage {
                    key: message.key,
                    payload: Some(message.payload),
                    partition: PARTITION,
                    offset: message.offset,
                });
            }

            appended.await;
        }
    }

    async fn close(&mut self) {
        self.topic = None;
    }
}
