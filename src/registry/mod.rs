//! Topic registry for pub/sub fan-out
//!
//! The registry manages one broadcast group per topic that currently has live
//! subscribers, and routes freshly written messages to them. It uses
//! `tokio::sync::broadcast` so one send reaches every subscriber without the
//! writer ever waiting on a slow one.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<TopicRegistry>
//!                     ┌─────────────────────────┐
//!                     │ groups: HashMap<Key,    │
//!                     │   TopicEntry {          │
//!                     │     tx: broadcast::Tx,  │
//!                     │     subscribers,        │
//!                     │   }                     │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!   [CacheActor]             [Session]               [Session]
//!   after append           sub.recv()              sub.recv()
//!         │                       │                       │
//!         └──► registry.broadcast()──► send_chunk() ──► HTTP
//! ```
//!
//! # Slow subscribers
//!
//! Every subscriber has a bounded backlog. One that falls further behind
//! loses its oldest undelivered messages and keeps streaming; other
//! subscribers and the writer are unaffected.

pub mod config;
pub mod entry;
pub mod error;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{SubscriberId, Subscription, TopicEntry};
pub use error::RegistryError;
pub use store::TopicRegistry;
