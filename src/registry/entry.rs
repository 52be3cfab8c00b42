//! Broadcast group and subscription types
//!
//! A [`TopicEntry`] is the fan-out group for one topic. Each subscriber holds
//! a [`Subscription`]: its own receiving end of the group's broadcast channel.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;

use crate::message::{Message, TopicKey};

use super::config::RegistryConfig;

/// Identifier of one registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub(super) u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fan-out group for a single topic
pub struct TopicEntry {
    /// Broadcast sender shared by all subscribers of the topic
    tx: broadcast::Sender<Arc<Message>>,

    /// Currently registered subscribers
    subscribers: HashSet<SubscriberId>,

    /// When the group was created
    pub created_at: Instant,
}

impl TopicEntry {
    /// Create an empty group
    pub(super) fn new(config: &RegistryConfig) -> Self {
        let (tx, _) = broadcast::channel(config.subscriber_capacity);

        Self {
            tx,
            subscribers: HashSet::new(),
            created_at: Instant::now(),
        }
    }

    /// Get the number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Attach a subscriber and hand out its receiver
    pub(super) fn subscribe(&mut self, id: SubscriberId) -> broadcast::Receiver<Arc<Message>> {
        self.subscribers.insert(id);
        self.tx.subscribe()
    }

    /// Detach a subscriber
    ///
    /// Returns false if the subscriber was not attached.
    pub(super) fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.subscribers.remove(&id)
    }

    /// Send a message to all subscribers
    ///
    /// Never waits on a subscriber. Returns the number of receivers that got
    /// the message, or 0 if there are none.
    pub(super) fn send(&self, message: Arc<Message>) -> usize {
        self.tx.send(message).unwrap_or(0)
    }
}

/// A subscriber's handle on a topic's broadcast group
///
/// Owned by exactly one streaming session. Dropping it detaches the receiver
/// but does not unregister; call [`TopicRegistry::unregister`] for that.
///
/// [`TopicRegistry::unregister`]: super::TopicRegistry::unregister
pub struct Subscription {
    key: TopicKey,
    id: SubscriberId,
    rx: broadcast::Receiver<Arc<Message>>,
    dropped: u64,
}

impl Subscription {
    pub(super) fn new(
        key: TopicKey,
        id: SubscriberId,
        rx: broadcast::Receiver<Arc<Message>>,
    ) -> Self {
        Self {
            key,
            id,
            rx,
            dropped: 0,
        }
    }

    /// Topic this subscription belongs to
    pub fn key(&self) -> &TopicKey {
        &self.key
    }

    /// Registry identifier of this subscriber
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Messages lost because this subscriber fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Wait for the next message
    ///
    /// If the subscriber has fallen further behind than its backlog allows,
    /// the oldest missed messages are skipped and counted in [`dropped`].
    /// Returns `None` once the group has been torn down by the registry.
    ///
    /// [`dropped`]: Self::dropped
    pub async fn recv(&mut self) -> Option<Arc<Message>> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    self.dropped += skipped;
                    tracing::warn!(
                        topic = %self.key,
                        subscriber = %self.id,
                        skipped = skipped,
                        "Subscriber lagging, dropped messages"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("dropped", &self.dropped)
            .finish()
    }
}
