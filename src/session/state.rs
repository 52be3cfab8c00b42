//! Session state machine
//!
//! Tracks a streaming session from subscription to teardown.

use tokio::time::Instant;

use crate::message::TopicKey;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Response head sent, not yet subscribed
    Init,
    /// Registered on the topic and delivering messages
    Subscribed,
    /// Terminal: unregistered and output finished
    Closing,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Writing to the peer failed, usually because it disconnected
    PeerGone,
    /// The registry tore down the topic's group
    ChannelClosed,
}

/// Complete session state
#[derive(Debug)]
pub struct SessionState {
    /// Topic being streamed
    pub key: TopicKey,

    /// Current phase
    pub phase: SessionPhase,

    /// When the session was opened
    pub opened_at: Instant,

    /// Messages written to the peer
    pub messages_sent: u64,

    /// Keepalive probes written to the peer
    pub keepalives_sent: u64,

    /// Reason for closing, once closed
    pub close_reason: Option<CloseReason>,
}

impl SessionState {
    /// Create a new session state
    pub fn new(key: TopicKey) -> Self {
        Self {
            key,
            phase: SessionPhase::Init,
            opened_at: Instant::now(),
            messages_sent: 0,
            keepalives_sent: 0,
            close_reason: None,
        }
    }

    /// Transition to subscribed
    pub fn subscribe(&mut self) {
        if self.phase == SessionPhase::Init {
            self.phase = SessionPhase::Subscribed;
        }
    }

    /// Enter the terminal phase
    pub fn close(&mut self, reason: CloseReason) {
        if self.phase != SessionPhase::Closing {
            self.phase = SessionPhase::Closing;
            self.close_reason = Some(reason);
        }
    }

    /// Get session duration
    pub fn duration(&self) -> std::time::Duration {
        self.opened_at.elapsed()
    }
}
