//! Request logging layer

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span};

type HttpTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    HttpMakeSpan,
    DefaultOnRequest,
    DefaultOnResponse,
>;

/// Span per request carrying method, uri and peer address
#[derive(Debug, Clone, Default)]
pub struct HttpMakeSpan;

impl<B> MakeSpan<B> for HttpMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "n/a".into());

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            peer = %peer,
        )
    }
}

/// Create a trace layer that logs each response with its latency
///
/// Streaming responses are logged when their head is sent, not when the
/// stream ends.
pub fn http_trace_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(HttpMakeSpan)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}
