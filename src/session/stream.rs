//! Streaming session protocol loop
//!
//! One session drives one long-lived response. It waits on two events:
//!
//! - a message arrives on its subscription: write it as one JSON line chunk
//! - the keepalive interval passes with nothing written: write a `\n` chunk
//!
//! A failed write means the peer is gone. A closed subscription means the
//! registry tore the topic down. Either way the session unregisters,
//! finishes its output and stops.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::{self, Instant};

use crate::message::{Message, TopicKey};
use crate::registry::{RegistryError, Subscription, TopicRegistry};

use super::sink::ChunkSink;
use super::state::{CloseReason, SessionState};

/// Default interval between keepalive probes
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Payload of a keepalive probe
const KEEPALIVE_PAYLOAD: &[u8] = b"\n";

/// A live stream of one topic to one peer
pub struct StreamingSession<S: ChunkSink> {
    state: SessionState,
    subscription: Subscription,
    registry: Arc<TopicRegistry>,
    sink: S,
    keepalive: Duration,
}

impl<S: ChunkSink> StreamingSession<S> {
    /// Subscribe to a topic and prepare the session
    ///
    /// Called once the response head is on its way. Fails only when the
    /// registry has been shut down.
    pub async fn open(
        registry: Arc<TopicRegistry>,
        key: TopicKey,
        sink: S,
        keepalive: Duration,
    ) -> Result<Self, RegistryError> {
        let mut state = SessionState::new(key);
        let subscription = registry.register(&state.key).await?;
        state.subscribe();

        Ok(Self {
            state,
            subscription,
            registry,
            sink,
            keepalive,
        })
    }

    /// Get the session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Deliver messages until the peer disconnects or the topic is torn down
    ///
    /// Returns the final session state.
    pub async fn run(mut self) -> SessionState {
        let keepalive = time::sleep(self.keepalive);
        tokio::pin!(keepalive);

        let reason = loop {
            let written = tokio::select! {
                message = self.subscription.recv() => match message {
                    Some(message) => self.deliver(&message).await,
                    None => break CloseReason::ChannelClosed,
                },
                () = &mut keepalive => self.probe().await,
            };

            if let Err(e) = written {
                tracing::debug!(
                    topic = %self.state.key,
                    error = %e,
                    "Stream write failed"
                );
                break CloseReason::PeerGone;
            }

            keepalive.as_mut().reset(Instant::now() + self.keepalive);
        };

        self.close(reason).await
    }

    async fn deliver(&mut self, message: &Message) -> std::io::Result<()> {
        let payload = match message.to_json_line() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(topic = %self.state.key, error = %e, "Skipping unencodable message");
                return Ok(());
            }
        };

        self.sink.send_chunk(payload).await?;
        self.state.messages_sent += 1;
        Ok(())
    }

    async fn probe(&mut self) -> std::io::Result<()> {
        self.sink
            .send_chunk(Bytes::from_static(KEEPALIVE_PAYLOAD))
            .await?;
        self.state.keepalives_sent += 1;
        Ok(())
    }

    async fn close(self, reason: CloseReason) -> SessionState {
        let Self {
            mut state,
            subscription,
            registry,
            sink,
            ..
        } = self;

        state.close(reason);
        registry
            .unregister(subscription.key(), subscription.id())
            .await;
        drop(subscription);
        sink.finish().await;

        tracing::info!(
            topic = %state.key,
            reason = ?reason,
            messages = state.messages_sent,
            keepalives = state.keepalives_sent,
            duration_secs = state.duration().as_secs(),
            "Streaming session closed"
        );

        state
    }
}
