//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::cache::CacheError;
use crate::registry::RegistryError;

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// An error reported to the HTTP client
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    /// Create an error with an explicit status
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 500 with the given message
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// HTTP status of this error
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "Request failed");
        }

        let body = ErrorBody {
            status: "error",
            code: self.code,
            message: &self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "cache_unavailable", err.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "streaming_unavailable", err.to_string())
    }
}

impl From<axum::http::Error> for ApiError {
    fn from(err: axum::http::Error) -> Self {
        Self::internal_server_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::Value;

    #[tokio::test]
    async fn test_into_response_serializes_json() {
        let response = ApiError::from(RegistryError::ShutDown).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "streaming_unavailable");
        assert_eq!(json["message"], "topic registry has been shut down");
    }

    #[test]
    fn test_cache_errors_are_server_errors() {
        let error = ApiError::from(CacheError::Closed);

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "cache_unavailable: cache worker is not running");
    }
}
