//! Error replies in the relay wire shape
//!
//! Non-streaming failures are JSON `{"error": "..."}` bodies; failures on a
//! promised event-stream are a single `data: {"error": "..."}` frame.

use aiapp_relay::RelayError;
use axum::Json;
use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub struct RelayFailure {
    status: StatusCode,
    message: String,
}

impl RelayFailure {
    pub fn missing_app_id() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "missing appId parameter".to_string(),
        }
    }

    pub fn unknown_app(id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("unknown app '{id}'"),
        }
    }

    pub fn kind_mismatch(id: &str, expected: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("app '{id}' is not a {expected} app"),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<RelayError> for RelayFailure {
    fn from(error: RelayError) -> Self {
        let status = match &error {
            RelayError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamStatus { .. }
            | RelayError::Transport(_)
            | RelayError::Backend(_) => StatusCode::BAD_GATEWAY,
            RelayError::Cancelled | RelayError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for RelayFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// One SSE frame carrying an error payload.
pub fn sse_error_frame(message: &str) -> String {
    format!("data: {}\n\n", json!({ "error": message }))
}

/// A complete event-stream response consisting of a single error frame.
pub fn sse_error_response(message: &str) -> Response {
    match Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from(sse_error_frame(message)))
    {
        Ok(response) => response,
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to build error response",
        )
            .into_response(),
    }
}
