//! Serialized message history
//!
//! The history store is owned by a single worker task. Request handlers talk
//! to it only through a [`CacheHandle`], which queues commands on a bounded
//! channel, so no lock is ever exposed to callers.
//!
//! The worker broadcasts each message to the topic registry right after
//! storing it, so history order and live delivery order agree.

pub mod actor;
pub mod config;
pub mod error;
pub mod history;

pub use actor::{CacheActor, CacheHandle, WriteReceipt};
pub use config::CacheConfig;
pub use error::CacheError;
pub use history::HistoryStore;
