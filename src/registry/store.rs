//! Topic registry implementation
//!
//! The central registry of broadcast groups. A group exists for a topic if
//! and only if at least one subscriber is registered on it: the first
//! `register` creates it, the last `unregister` removes it.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::message::{Message, TopicKey};

use super::config::RegistryConfig;
use super::entry::{SubscriberId, Subscription, TopicEntry};
use super::error::RegistryError;

/// State guarded by the registry lock
#[derive(Default)]
struct Topics {
    groups: HashMap<TopicKey, TopicEntry>,
    shut_down: bool,
}

/// Reference-counted registry of per-topic broadcast groups
///
/// Thread-safe via `RwLock`. Group creation and removal (`register`,
/// `unregister`, `shutdown`) take the write lock, so no caller ever sees a
/// group whose subscriber count is stale. Broadcasts and lookups share the
/// read lock and run concurrently with each other.
pub struct TopicRegistry {
    /// Map of topic key to broadcast group
    topics: RwLock<Topics>,

    /// Source of subscriber identifiers
    next_subscriber_id: AtomicU64,

    /// Configuration
    config: RegistryConfig,
}

impl TopicRegistry {
    /// Create a new topic registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new topic registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            topics: RwLock::new(Topics::default()),
            next_subscriber_id: AtomicU64::new(1),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a subscriber on a topic
    ///
    /// Creates the topic's broadcast group if this is its first subscriber.
    /// Fails only after [`shutdown`](Self::shutdown).
    pub async fn register(&self, key: &TopicKey) -> Result<Subscription, RegistryError> {
        let mut topics = self.topics.write().await;

        if topics.shut_down {
            return Err(RegistryError::ShutDown);
        }

        let id = SubscriberId(self.next_subscriber_id.fetch_add(1, Ordering::Relaxed));

        let entry = topics.groups.entry(key.clone()).or_insert_with(|| {
            tracing::debug!(topic = %key, "Topic group created");
            TopicEntry::new(&self.config)
        });
        let rx = entry.subscribe(id);

        tracing::info!(
            topic = %key,
            subscriber = %id,
            subscribers = entry.subscriber_count(),
            "Subscriber registered"
        );

        Ok(Subscription::new(key.clone(), id, rx))
    }

    /// Unregister a subscriber from a topic
    ///
    /// Removes the topic's group once its last subscriber is gone. Unknown
    /// topics and subscribers are ignored, so this is safe to call more than
    /// once. Returns whether the subscriber was registered.
    pub async fn unregister(&self, key: &TopicKey, id: SubscriberId) -> bool {
        let mut topics = self.topics.write().await;

        let Some(entry) = topics.groups.get_mut(key) else {
            return false;
        };
        if !entry.unsubscribe(id) {
            return false;
        }

        let remaining = entry.subscriber_count();
        if remaining == 0 {
            if let Some(entry) = topics.groups.remove(key) {
                tracing::debug!(
                    topic = %key,
                    lifetime_secs = entry.created_at.elapsed().as_secs(),
                    "Topic group removed"
                );
            }
        }

        tracing::info!(
            topic = %key,
            subscriber = %id,
            subscribers = remaining,
            "Subscriber unregistered"
        );

        true
    }

    /// Broadcast a message to every subscriber of a topic
    ///
    /// A no-op when the topic has no subscribers. Returns the number of
    /// subscribers the message was queued for.
    pub async fn broadcast(&self, key: &TopicKey, message: Arc<Message>) -> usize {
        let topics = self.topics.read().await;

        match topics.groups.get(key) {
            Some(entry) => entry.send(message),
            None => 0,
        }
    }

    /// Get the number of subscribers on a topic
    pub async fn subscriber_count(&self, key: &TopicKey) -> usize {
        let topics = self.topics.read().await;

        topics
            .groups
            .get(key)
            .map_or(0, TopicEntry::subscriber_count)
    }

    /// Check if a topic currently has a broadcast group
    pub async fn topic_exists(&self, key: &TopicKey) -> bool {
        self.topics.read().await.groups.contains_key(key)
    }

    /// Get total number of topics with subscribers
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.groups.len()
    }

    /// Tear down every broadcast group
    ///
    /// Each subscriber's channel closes once it has drained what was already
    /// sent, which ends its session. Later `register` calls fail.
    pub async fn shutdown(&self) {
        let mut topics = self.topics.write().await;

        topics.shut_down = true;
        let removed = topics.groups.len();
        topics.groups.clear();

        tracing::info!(topics = removed, "Topic registry shut down");
    }
}

impl fmt::Debug for TopicRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicRegistry")
            .field("config", &self.config)
            .field("next_subscriber_id", &self.next_subscriber_id)
            .finish_non_exhaustive()
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::message::FormValues;

    fn message(text: &str) -> Arc<Message> {
        let mut values = FormValues::new();
        values.insert("text".into(), vec![text.into()]);
        Arc::new(Message::new("t", values))
    }

    #[tokio::test]
    async fn test_register_creates_group() {
        let registry = TopicRegistry::new();
        let key = TopicKey::hashed("t");

        assert!(!registry.topic_exists(&key).await);

        let _sub = registry.register(&key).await.unwrap();
        assert!(registry.topic_exists(&key).await);
        assert_eq!(registry.subscriber_count(&key).await, 1);
    }

    #[tokio::test]
    async fn test_last_unregister_removes_group() {
        let registry = TopicRegistry::new();
        let key = TopicKey::hashed("t");

        let first = registry.register(&key).await.unwrap();
        let second = registry.register(&key).await.unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(registry.subscriber_count(&key).await, 2);

        assert!(registry.unregister(&key, first.id()).await);
        assert!(registry.topic_exists(&key).await);
        assert_eq!(registry.subscriber_count(&key).await, 1);

        assert!(registry.unregister(&key, second.id()).await);
        assert!(!registry.topic_exists(&key).await);
        assert_eq!(registry.subscriber_count(&key).await, 0);
        assert_eq!(registry.topic_count().await, 0);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = TopicRegistry::new();
        let key = TopicKey::hashed("t");
        let other = TopicKey::hashed("other");

        let first = registry.register(&key).await.unwrap();
        let second = registry.register(&key).await.unwrap();

        assert!(registry.unregister(&key, first.id()).await);
        assert!(!registry.unregister(&key, first.id()).await);
        assert!(!registry.unregister(&other, second.id()).await);
        assert_eq!(registry.subscriber_count(&key).await, 1);
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_noop() {
        let registry = TopicRegistry::new();
        let key = TopicKey::hashed("nobody");

        assert_eq!(registry.broadcast(&key, message("m1")).await, 0);
        assert!(!registry.topic_exists(&key).await);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_each_subscriber_once() {
        let registry = TopicRegistry::new();
        let key = TopicKey::hashed("t");

        let mut subs = Vec::new();
        for _ in 0..3 {
            subs.push(registry.register(&key).await.unwrap());
        }

        assert_eq!(registry.broadcast(&key, message("m1")).await, 3);

        for sub in &mut subs {
            let received = sub.recv().await.unwrap();
            assert_eq!(received.values["text"], vec!["m1"]);

            let again = tokio::time::timeout(Duration::from_millis(20), sub.recv()).await;
            assert!(again.is_err(), "message delivered twice");
        }
    }

    #[tokio::test]
    async fn test_broadcast_is_per_topic() {
        let registry = TopicRegistry::new();
        let a = TopicKey::hashed("a");
        let b = TopicKey::hashed("b");

        let mut sub_a = registry.register(&a).await.unwrap();
        let mut sub_b = registry.register(&b).await.unwrap();

        registry.broadcast(&a, message("for-a")).await;

        assert_eq!(sub_a.recv().await.unwrap().values["text"], vec!["for-a"]);
        let nothing = tokio::time::timeout(Duration::from_millis(20), sub_b.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_drops_oldest() {
        let config = RegistryConfig::default().subscriber_capacity(2);
        let registry = TopicRegistry::with_config(config);
        let key = TopicKey::hashed("t");

        let mut slow = registry.register(&key).await.unwrap();
        let mut fast = registry.register(&key).await.unwrap();

        for text in ["m1", "m2", "m3", "m4"] {
            registry.broadcast(&key, message(text)).await;
            assert_eq!(fast.recv().await.unwrap().values["text"], vec![text]);
        }

        // Only the newest two survive for the slow subscriber
        assert_eq!(slow.recv().await.unwrap().values["text"], vec!["m3"]);
        assert_eq!(slow.recv().await.unwrap().values["text"], vec!["m4"]);
        assert_eq!(slow.dropped(), 2);
        assert_eq!(fast.dropped(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_subscriptions() {
        let registry = TopicRegistry::new();
        let key = TopicKey::hashed("t");

        let mut sub = registry.register(&key).await.unwrap();
        registry.broadcast(&key, message("last")).await;
        registry.shutdown().await;

        // Already-sent messages drain before the channel reports closed
        assert!(sub.recv().await.is_some());
        assert!(sub.recv().await.is_none());

        assert_eq!(registry.topic_count().await, 0);
        assert!(!registry.unregister(&key, sub.id()).await);
        assert!(matches!(
            registry.register(&key).await,
            Err(RegistryError::ShutDown)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_register_unregister() {
        let registry = Arc::new(TopicRegistry::new());
        let key = TopicKey::hashed("busy");

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let key = key.clone();
                tokio::spawn(async move {
                    let sub = registry.register(&key).await.unwrap();
                    tokio::task::yield_now().await;
                    registry.unregister(&key, sub.id()).await
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap());
        }

        assert!(!registry.topic_exists(&key).await);
        assert_eq!(registry.topic_count().await, 0);
    }
}
