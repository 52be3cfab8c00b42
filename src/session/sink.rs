//! Chunk output for streaming sessions
//!
//! A session writes its output one unit at a time through [`ChunkSink`].
//! The HTTP implementation, [`BodySink`], feeds a streaming response body
//! that has no content length. hyper writes each unit as one
//! `<hex length>\r\n<payload>\r\n` chunk, flushes it, and writes the
//! zero-length terminating chunk once the sink is finished.

use std::future::Future;
use std::io;

use axum::body::Body;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Units queued between a session and the response body
///
/// Kept at one so a session learns about a vanished peer on its next write
/// rather than after filling a deep buffer.
pub const BODY_BUFFER: usize = 1;

/// Destination for a session's chunked output
pub trait ChunkSink: Send {
    /// Write one chunk and push it to the peer
    ///
    /// An error means the peer can no longer be written to.
    fn send_chunk(&mut self, payload: Bytes) -> impl Future<Output = io::Result<()>> + Send;

    /// End the stream with its terminating chunk and release the connection
    fn finish(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

/// Sink backed by a streaming HTTP response body
#[derive(Debug)]
pub struct BodySink {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl BodySink {
    /// Create a sink and the response body it feeds
    pub fn channel() -> (Self, Body) {
        let (tx, rx) = mpsc::channel(BODY_BUFFER);
        let body = Body::from_stream(ReceiverStream::new(rx));

        (Self { tx }, body)
    }
}

impl ChunkSink for BodySink {
    async fn send_chunk(&mut self, payload: Bytes) -> io::Result<()> {
        // The body is dropped when the connection goes away
        self.tx
            .send(Ok(payload))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body dropped"))
    }

    async fn finish(self) {
        drop(self.tx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_body_receives_chunks_then_ends() {
        let (mut sink, body) = BodySink::channel();

        let writer = tokio::spawn(async move {
            sink.send_chunk(Bytes::from_static(b"{\"a\":1}\n")).await.unwrap();
            sink.send_chunk(Bytes::from_static(b"\n")).await.unwrap();
            sink.finish().await;
        });

        let collected = axum::body::to_bytes(body, 1024).await.unwrap();
        writer.await.unwrap();

        assert_eq!(&collected[..], b"{\"a\":1}\n\n");
    }

    #[tokio::test]
    async fn test_dropped_body_fails_writes() {
        let (mut sink, body) = BodySink::channel();
        drop(body);

        let err = sink.send_chunk(Bytes::from_static(b"\n")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
