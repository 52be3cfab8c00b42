//! Streaming session management
//!
//! This module contains the per-connection protocol loop that streams a
//! topic's live messages to one peer, interleaved with keepalive probes.

pub mod sink;
pub mod state;
pub mod stream;

pub use sink::{BodySink, ChunkSink};
pub use state::{CloseReason, SessionPhase, SessionState};
pub use stream::{StreamingSession, DEFAULT_KEEPALIVE_INTERVAL};
