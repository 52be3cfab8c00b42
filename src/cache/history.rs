//! Per-topic message history
//!
//! A bounded, TTL-backed map from topic key to its most recent messages.
//! Each history is capped at `max_history` entries (oldest evicted first) and
//! expires `item_lifetime` after the last write to that topic. Expiry is
//! sliding: every append pushes the deadline out again.
//!
//! The store has no internal locking. It is owned by the cache worker, which
//! is the only thing allowed to touch it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::message::{Message, TopicKey};

use super::config::CacheConfig;

/// History of a single topic
#[derive(Debug)]
struct HistoryEntry {
    /// Messages in insertion order
    messages: VecDeque<Arc<Message>>,
    /// When this history stops being visible
    expires_at: Instant,
}

impl HistoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Bounded, expiring message history keyed by topic
#[derive(Debug)]
pub struct HistoryStore {
    entries: HashMap<TopicKey, HistoryEntry>,
    max_history: usize,
    item_lifetime: Duration,
}

impl HistoryStore {
    /// Create a store with the given per-topic capacity and idle lifetime
    pub fn new(max_history: usize, item_lifetime: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_history: max_history.max(1),
            item_lifetime,
        }
    }

    /// Create a store from cache configuration
    pub fn with_config(config: &CacheConfig) -> Self {
        Self::new(config.max_history, config.item_lifetime)
    }

    /// Per-topic capacity
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Get a topic's messages, oldest first
    ///
    /// Absent and expired topics both yield an empty history.
    pub fn get(&self, key: &TopicKey) -> Vec<Arc<Message>> {
        let now = Instant::now();

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => entry.messages.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Append a message to a topic's history
    ///
    /// Evicts the oldest message when the history is full and refreshes the
    /// topic's expiry. Returns the history length after the append.
    pub fn append(&mut self, key: TopicKey, message: Arc<Message>) -> usize {
        let now = Instant::now();
        let expires_at = now + self.item_lifetime;
        let max_history = self.max_history;

        let entry = self.entries.entry(key).or_insert_with(|| HistoryEntry {
            messages: VecDeque::with_capacity(max_history),
            expires_at,
        });

        // An expired history is gone even if the purge has not run yet
        if entry.is_expired(now) {
            entry.messages.clear();
        }

        entry.messages.push_back(message);
        while entry.messages.len() > max_history {
            entry.messages.pop_front();
        }
        entry.expires_at = expires_at;

        entry.messages.len()
    }

    /// Remove every expired history
    ///
    /// Returns the number of topics removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired(now));

        before - self.entries.len()
    }

    /// Number of topics currently held (including expired, unpurged ones)
    pub fn topic_count(&self) -> usize {
        self.entries.len()
    }
}
