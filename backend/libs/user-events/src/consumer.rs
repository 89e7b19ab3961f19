//! Long-lived consumer for user notification events.
//!
//! One consumer instance owns one [`EventSource`] and runs a single receive
//! loop on a tokio task:
//!
//! ```text
//! Idle → Subscribed → Receiving ⇄ Processing
//!                         ↓
//!                  Faulted | Stopped
//! ```
//!
//! Decode and handler failures are contained to their message. A transport
//! error while receiving faults the instance; it does not restart itself.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::codec;
use crate::error::ConsumerError;
use crate::metrics;
use crate::record::UserRecord;
use crate::transport::{EventSource, ReceivedMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Idle,
    Subscribed,
    Receiving,
    Processing,
    Faulted,
    Stopped,
}

impl ConsumerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConsumerState::Faulted | ConsumerState::Stopped)
    }
}

/// Processing callback for decoded records.
///
/// Delivery is at-least-once, so implementations must tolerate seeing the same
/// record more than once (keyed on `id`).
#[async_trait]
pub trait RecordHandler: Send + Sync {
    async fn handle(&self, record: UserRecord) -> anyhow::Result<()>;
}

/// Logs every consumed record. Idempotent by nature.
pub struct LoggingHandler;

#[async_trait]
impl RecordHandler for LoggingHandler {
    async fn handle(&self, record: UserRecord) -> anyhow::Result<()> {
        info!(
            user_id = ?record.id,
            name = %record.name,
            email = %record.email,
            phone = ?record.phone,
            "Consumed user event"
        );
        Ok(())
    }
}

/// Counters for the lifetime of one consumer instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub processed: u64,
    pub decode_failures: u64,
    pub handler_failures: u64,
}

pub struct UserEventConsumer<S> {
    source: S,
    handler: Arc<dyn RecordHandler>,
    topic: String,
    state_tx: watch::Sender<ConsumerState>,
}

impl<S> UserEventConsumer<S>
where
    S: EventSource + 'static,
{
    pub fn new(source: S, handler: Arc<dyn RecordHandler>, topic: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(ConsumerState::Idle);
        Self {
            source,
            handler,
            topic: topic.into(),
            state_tx,
        }
    }

    pub fn state(&self) -> ConsumerState {
        *self.state_tx.borrow()
    }

    /// Subscribe and spawn the receive loop.
    ///
    /// A subscribe failure leaves the consumer `Faulted` and is returned
    /// directly; nothing is spawned in that case.
    pub async fn start(mut self) -> Result<ConsumerHandle, ConsumerError> {
        if let Err(source) = self.source.subscribe(&self.topic).await {
            error!(
                topic = %self.topic,
                group_id = %self.source.group_id(),
                error = %source,
                "Failed to subscribe user events consumer"
            );
            self.set_state(ConsumerState::Faulted);
            return Err(ConsumerError::Subscribe {
                topic: self.topic,
                source,
            });
        }

        self.set_state(ConsumerState::Subscribed);
        info!(
            topic = %self.topic,
            group_id = %self.source.group_id(),
            "User events consumer subscribed"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state_rx = self.state_tx.subscribe();
        let join = tokio::spawn(self.run(shutdown_rx));

        Ok(ConsumerHandle {
            shutdown_tx,
            state_rx,
            join,
        })
    }

    async fn run(
        mut self,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<ConsumerReport, ConsumerError> {
        let mut report = ConsumerReport::default();

        let outcome = loop {
            self.set_state(ConsumerState::Receiving);

            let next = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => None,
                received = self.source.recv() => Some(received),
            };

            match next {
                None => break Ok(()),
                Some(Ok(message)) => {
                    self.set_state(ConsumerState::Processing);
                    process_message(&self.handler, &self.topic, message, &mut report).await;
                }
                Some(Err(e)) => {
                    error!(
                        topic = %self.topic,
                        group_id = %self.source.group_id(),
                        error = %e,
                        "User events consumer receive failed"
                    );
                    break Err(ConsumerError::Transport(e));
                }
            }
        };

        self.source.close().await;

        match outcome {
            Ok(()) => {
                self.set_state(ConsumerState::Stopped);
                info!(
                    topic = %self.topic,
                    processed = report.processed,
                    decode_failures = report.decode_failures,
                    handler_failures = report.handler_failures,
                    "User events consumer stopped"
                );
                Ok(report)
            }
            Err(e) => {
                self.set_state(ConsumerState::Faulted);
                Err(e)
            }
        }
    }

    fn set_state(&self, state: ConsumerState) {
        self.state_tx.send_replace(state);
    }
}

async fn process_message(
    handler: &Arc<dyn RecordHandler>,
    topic: &str,
    message: ReceivedMessage,
    report: &mut ConsumerReport,
) {
    debug!(
        key = ?message.key,
        partition = message.partition,
        offset = message.offset,
        "Received user event"
    );

    let record = match codec::decode(message.payload.as_deref().unwrap_or_default()) {
        Ok(record) => record,
        Err(e) => {
            error!(
                topic = %topic,
                key = ?message.key,
                partition = message.partition,
                offset = message.offset,
                reason = %e.reason,
                raw_payload = %e.raw_input,
                "Skipping undecodable user event"
            );
            report.decode_failures += 1;
            metrics::record_consume("decode_failed");
            return;
        }
    };

    let user_id = record.id;
    match AssertUnwindSafe(handler.handle(record))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => {
            report.processed += 1;
            metrics::record_consume("processed");
        }
        Ok(Err(e)) => {
            error!(
                user_id = ?user_id,
                offset = message.offset,
                error = ?e,
                "User event handler failed"
            );
            report.handler_failures += 1;
            metrics::record_consume("handler_failed");
        }
        Err(_) => {
            error!(
                user_id = ?user_id,
                offset = message.offset,
                "User event handler panicked"
            );
            report.handler_failures += 1;
            metrics::record_consume("handler_failed");
        }
    }
}

/// Control handle for a running consumer. Dropping it stops the loop.
pub struct ConsumerHandle {
    shutdown_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<ConsumerState>,
    join: JoinHandle<Result<ConsumerReport, ConsumerError>>,
}

impl ConsumerHandle {
    pub fn state(&self) -> ConsumerState {
        *self.state_rx.borrow()
    }

    /// Watch state transitions, e.g. to wait for `Faulted`.
    pub fn watch_state(&self) -> watch::Receiver<ConsumerState> {
        self.state_rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signal shutdown and wait for the loop to release its source.
    pub async fn stop(self) -> Result<ConsumerReport, ConsumerError> {
        // An Err here only means the loop already exited.
        let _ = self.shutdown_tx.send(true);
        self.wait().await
    }

    /// Wait for the loop to end on its own (fault or external shutdown).
    pub async fn wait(self) -> Result<ConsumerReport, ConsumerError> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(ConsumerError::Aborted(e.to_string())),
        }
    }
}
