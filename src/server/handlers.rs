//! HTTP handlers
//!
//! Thin glue between requests and the cache worker / topic registry. Form
//! input is parsed permissively: missing or malformed fields never fail a
//! request.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::message::{parse_form, FormValues, Message, TopicKey};
use crate::session::{BodySink, StreamingSession};

use super::error::ApiResult;
use super::state::AppState;

const HOME_PAGE: &str = "This is a <a href='https://github.com/skorokithakis/gweet/'>Gweet server</a>. \
Please read the documentation on how to talk to it.";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Response to a successful publish
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    /// Always `"success"`
    pub status: &'static str,
    /// The stored message
    pub message: Arc<Message>,
}

/// Response to a snapshot read
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    /// Most recent messages, oldest first
    pub messages: Vec<Arc<Message>>,
}

/// `GET /`
pub async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

/// `GET /stream/{key}/`
///
/// Serves a snapshot, or a live stream when `streaming=1` is given.
pub async fn read_stream(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let params = parse_form([query.as_deref().unwrap_or_default().as_bytes()]);
    let key = TopicKey::hashed(&name);

    if first_value(&params, "streaming") == Some("1") {
        open_stream(state, key).await
    } else {
        let latest = parse_latest(first_value(&params, "latest"), state.cache.max_history());
        snapshot(&state, &key, latest).await
    }
}

/// `POST /stream/{key}/`
pub async fn publish(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<PublishResponse>> {
    let key = TopicKey::hashed(&name);
    ingest(&state, key, name, &headers, query.as_deref(), &body).await
}

/// `POST /push/{hash}/`
///
/// Publishes to the topic whose hashed key is given, without knowing its name.
pub async fn push(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<PublishResponse>> {
    let key = TopicKey::prehashed(hash.clone());
    ingest(&state, key, hash, &headers, query.as_deref(), &body).await
}

/// Store a message and hand it to live subscribers
async fn ingest(
    state: &AppState,
    key: TopicKey,
    name: String,
    headers: &HeaderMap,
    query: Option<&str>,
    body: &[u8],
) -> ApiResult<Json<PublishResponse>> {
    let form_body: &[u8] = if is_form_body(headers) { body } else { &[] };
    let values = parse_form([form_body, query.unwrap_or_default().as_bytes()]);
    let message = Arc::new(Message::new(name, values));

    let receipt = state.cache.write(key.clone(), Arc::clone(&message)).await?;

    tracing::debug!(
        topic = %key,
        history = receipt.history_len,
        subscribers = receipt.delivered,
        "Message published"
    );

    Ok(Json(PublishResponse {
        status: "success",
        message,
    }))
}

async fn snapshot(state: &AppState, key: &TopicKey, latest: usize) -> ApiResult<Response> {
    let mut messages = state.cache.read(key).await?;
    let start = messages.len().saturating_sub(latest);
    messages.drain(..start);

    Ok(Json(SnapshotResponse { messages }).into_response())
}

async fn open_stream(state: AppState, key: TopicKey) -> ApiResult<Response> {
    let (sink, body) = BodySink::channel();

    // No content length: the body goes out with chunked transfer encoding
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(body)?;

    let session =
        StreamingSession::open(Arc::clone(&state.registry), key, sink, state.keepalive).await?;
    tokio::spawn(session.run());

    Ok(response)
}

fn first_value<'a>(params: &'a FormValues, field: &str) -> Option<&'a str> {
    params
        .get(field)
        .and_then(|values| values.first())
        .map(String::as_str)
}

/// Number of messages a snapshot returns
///
/// Missing, unparsable and non-positive values fall back to `max`, as do
/// values above it.
fn parse_latest(raw: Option<&str>, max: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .and_then(|n| usize::try_from(n).ok())
        .filter(|&n| n > 0)
        .map_or(max, |n| n.min(max))
}

/// Whether the request body should be read as a url-encoded form
///
/// A body without a content type is treated as opaque bytes.
fn is_form_body(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|content_type| content_type.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_parse_latest() {
        assert_eq!(parse_latest(None, 100), 100);
        assert_eq!(parse_latest(Some("10"), 100), 10);
        assert_eq!(parse_latest(Some("1"), 100), 1);
        assert_eq!(parse_latest(Some("100"), 100), 100);
        assert_eq!(parse_latest(Some("500"), 100), 100);
        assert_eq!(parse_latest(Some("0"), 100), 100);
        assert_eq!(parse_latest(Some("-3"), 100), 100);
        assert_eq!(parse_latest(Some("ten"), 100), 100);
        assert_eq!(parse_latest(Some(""), 100), 100);
    }

    #[test]
    fn test_is_form_body() {
        let mut headers = HeaderMap::new();
        assert!(!is_form_body(&headers));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=utf-8"),
        );
        assert!(is_form_body(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_form_body(&headers));
    }

    #[test]
    fn test_first_value() {
        let params = parse_form([&b"streaming=1&streaming=0&latest="[..]]);

        assert_eq!(first_value(&params, "streaming"), Some("1"));
        assert_eq!(first_value(&params, "latest"), Some(""));
        assert_eq!(first_value(&params, "missing"), None);
    }
}
