//! Cache worker and its command handle
//!
//! All reads and writes of the [`HistoryStore`] go through a single bounded
//! command queue consumed by one worker task. The total order of that queue
//! is what makes the store safe: a read never sees a half-applied write and
//! writes to one topic land in submission order.
//!
//! The worker also hands each written message to the [`TopicRegistry`] right
//! after appending it, so live subscribers see a topic's messages in the
//! same order as its history.
//!
//! ```text
//!   [handler] ──┐                                  ┌──► HistoryStore
//!   [handler] ──┼──► mpsc (bounded) ──► CacheActor ┤
//!   [handler] ──┘         ▲                  │     └──► TopicRegistry::broadcast
//!                         └──── oneshot ◄────┘
//! ```
//!
//! When the worker falls behind the queue fills up and callers wait for a
//! free slot instead of piling up unbounded work.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::message::{Message, TopicKey};
use crate::registry::TopicRegistry;

use super::config::CacheConfig;
use super::error::CacheError;
use super::history::HistoryStore;

/// A request to the cache worker
#[derive(Debug)]
enum CacheCommand {
    /// Snapshot a topic's history
    Read {
        key: TopicKey,
        reply: oneshot::Sender<Vec<Arc<Message>>>,
    },
    /// Append to a topic's history
    Write {
        key: TopicKey,
        message: Arc<Message>,
        ack: oneshot::Sender<WriteReceipt>,
    },
}

/// Outcome of an applied write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Length of the topic's history after the append
    pub history_len: usize,
    /// Live subscribers the message was queued for
    pub delivered: usize,
}

/// Cloneable handle for issuing commands to the cache worker
#[derive(Debug, Clone)]
pub struct CacheHandle {
    tx: mpsc::Sender<CacheCommand>,
    max_history: usize,
}

impl CacheHandle {
    /// Create a handle and spawn its worker on the current runtime
    ///
    /// Written messages are broadcast through `registry`.
    pub fn spawn(config: CacheConfig, registry: Arc<TopicRegistry>) -> (Self, JoinHandle<()>) {
        let (handle, actor) = Self::new(config, registry);
        let task = tokio::spawn(actor.run());
        (handle, task)
    }

    /// Create a handle and its worker without starting the worker
    pub fn new(config: CacheConfig, registry: Arc<TopicRegistry>) -> (Self, CacheActor) {
        let (tx, rx) = mpsc::channel(config.command_capacity);

        let handle = Self {
            tx,
            max_history: config.max_history,
        };
        let actor = CacheActor {
            rx,
            store: HistoryStore::with_config(&config),
            registry,
            cleanup_interval: config.cleanup_interval,
        };

        (handle, actor)
    }

    /// Per-topic history capacity of the underlying store
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Get a topic's messages, oldest first
    ///
    /// An absent or expired topic yields an empty history.
    pub async fn read(&self, key: &TopicKey) -> Result<Vec<Arc<Message>>, CacheError> {
        let (reply, rx) = oneshot::channel();

        self.tx
            .send(CacheCommand::Read {
                key: key.clone(),
                reply,
            })
            .await
            .map_err(|_| CacheError::Closed)?;

        rx.await.map_err(|_| CacheError::Closed)
    }

    /// Append a message to a topic's history and broadcast it
    ///
    /// The message is stored before any subscriber can receive it. Resolves
    /// once both have happened. Waits for queue space when the worker is
    /// behind.
    pub async fn write(
        &self,
        key: TopicKey,
        message: Arc<Message>,
    ) -> Result<WriteReceipt, CacheError> {
        let (ack, rx) = oneshot::channel();

        self.tx
            .send(CacheCommand::Write { key, message, ack })
            .await
            .map_err(|_| CacheError::Closed)?;

        rx.await.map_err(|_| CacheError::Closed)
    }

    #[cfg(test)]
    fn queued_commands(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

/// The single worker that owns the history store
#[derive(Debug)]
pub struct CacheActor {
    rx: mpsc::Receiver<CacheCommand>,
    store: HistoryStore,
    registry: Arc<TopicRegistry>,
    cleanup_interval: Duration,
}

impl CacheActor {
    /// Process commands until every [`CacheHandle`] has been dropped
    ///
    /// Expired histories are purged every `cleanup_interval`, serialized with
    /// the commands.
    pub async fn run(mut self) {
        let mut cleanup = time::interval_at(
            Instant::now() + self.cleanup_interval,
            self.cleanup_interval,
        );
        cleanup.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(
            max_history = self.store.max_history(),
            "Cache worker started"
        );

        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(command) => self.apply(command).await,
                    None => break,
                },
                _ = cleanup.tick() => {
                    let removed = self.store.purge_expired();
                    if removed > 0 {
                        tracing::debug!(
                            removed = removed,
                            remaining = self.store.topic_count(),
                            "Purged expired histories"
                        );
                    }
                }
            }
        }

        tracing::debug!("Cache worker stopped");
    }

    async fn apply(&mut self, command: CacheCommand) {
        match command {
            CacheCommand::Read { key, reply } => {
                // The caller may have given up waiting
                let _ = reply.send(self.store.get(&key));
            }
            CacheCommand::Write { key, message, ack } => {
                let history_len = self.store.append(key.clone(), Arc::clone(&message));
                let delivered = self.registry.broadcast(&key, message).await;
                let _ = ack.send(WriteReceipt {
                    history_len,
                    delivered,
                });
            }
        }
    }
}
