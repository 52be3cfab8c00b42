//! Gweet: a keyed, ephemeral message queue over HTTP
//!
//! Clients POST form-encoded values under a topic name and other clients GET
//! the most recent values for that topic, either as a snapshot or as a live
//! stream over one long-lived chunked response.
//!
//! # Architecture
//!
//! ```text
//!   POST /stream/{key}/ ──► CacheHandle::write ──► CacheActor ──► HistoryStore
//!                                                      │
//!                                                      └──► TopicRegistry::broadcast
//!                                                                 │
//!                                             peer ◄── StreamingSession
//!
//!   GET /stream/{key}/  ──► CacheHandle::read  (snapshot, registry not involved)
//! ```
//!
//! - [`cache`]: single-worker history store, bounded per topic and expiring
//!   after a period without writes
//! - [`registry`]: reference-counted broadcast groups, one per topic with
//!   live subscribers
//! - [`session`]: the streaming protocol loop with keepalive probes
//! - [`server`]: axum routes, handlers and the listener
//!
//! # Example
//!
//! ```no_run
//! use gweet::{GweetServer, ServerConfig};
//!
//! # async fn example() -> gweet::Result<()> {
//! let config = ServerConfig::with_addr("127.0.0.1:9835".parse().unwrap());
//! GweetServer::new(config).run().await
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;

pub use cache::{CacheConfig, CacheHandle};
pub use error::{Error, Result};
pub use message::{Message, TopicKey};
pub use registry::{RegistryConfig, TopicRegistry};
pub use server::{GweetServer, ServerConfig};
pub use session::StreamingSession;
