//! Streaming and blocking relay handlers
//!
//! The streaming path is a pass-through pipe: upstream chunks are copied to
//! the caller in arrival order, unmodified. Exactly one upstream connection
//! is opened per client request, and nothing survives the response.

use aiapp_relay::{AppKind, ChatRequest, ResponseMode, Result as RelayResult, WorkflowRunRequest};
use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::convert::Infallible;

use crate::api::error::{RelayFailure, sse_error_frame, sse_error_response};
use crate::api::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RelayParams {
    #[serde(rename = "appId")]
    pub app_id: Option<String>,
}

// POST /api/dify/chat-messages?appId=
pub async fn chat_messages(
    State(state): State<AppState>,
    Query(params): Query<RelayParams>,
    Json(request): Json<ChatRequest>,
) -> Response {
    message_relay(state, params, request, AppKind::Chat).await
}

// POST /api/dify/completion-messages?appId=
pub async fn completion_messages(
    State(state): State<AppState>,
    Query(params): Query<RelayParams>,
    Json(request): Json<ChatRequest>,
) -> Response {
    message_relay(state, params, request, AppKind::Completion).await
}

async fn message_relay(
    state: AppState,
    params: RelayParams,
    request: ChatRequest,
    kind: AppKind,
) -> Response {
    let app = match state.resolve(params.app_id.as_deref(), kind) {
        Ok(app) => app,
        Err(failure) => return failure.into_response(),
    };

    match request.mode() {
        ResponseMode::Blocking => {
            blocking_reply(state.dify.message_block(&app, &request).await)
        }
        ResponseMode::Streaming => {
            let body = request.wire_body(ResponseMode::Streaming);
            stream_reply(state.dify.open_stream(&app, body).await)
        }
    }
}

// POST /api/dify/workflow/run/stream?appId=
pub async fn workflow_run_stream(
    State(state): State<AppState>,
    Query(params): Query<RelayParams>,
    Json(request): Json<WorkflowRunRequest>,
) -> Response {
    let app = match state.resolve(params.app_id.as_deref(), AppKind::Workflow) {
        Ok(app) => app,
        Err(failure) => return failure.into_response(),
    };

    let body = request.wire_body(ResponseMode::Streaming);
    stream_reply(state.dify.open_stream(&app, body).await)
}

// POST /api/dify/workflow/run/block?appId=
pub async fn workflow_run_block(
    State(state): State<AppState>,
    Query(params): Query<RelayParams>,
    Json(request): Json<WorkflowRunRequest>,
) -> Response {
    let app = match state.resolve(params.app_id.as_deref(), AppKind::Workflow) {
        Ok(app) => app,
        Err(failure) => return failure.into_response(),
    };

    blocking_reply(state.dify.workflow_block(&app, &request).await)
}

/// Blocking responses pass the upstream JSON through unmodified.
pub(crate) fn blocking_reply(result: RelayResult<Value>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(error) => RelayFailure::from(error).into_response(),
    }
}

/// Streaming responses re-emit the upstream bytes under stable SSE framing.
/// Failures before the first byte become a single synthetic error frame.
fn stream_reply(result: RelayResult<reqwest::Response>) -> Response {
    let upstream = match result {
        Ok(upstream) => upstream,
        Err(error) => {
            tracing::warn!("upstream request failed before streaming: {}", error);
            return sse_error_response(&error.to_string());
        }
    };

    match Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(relay_stream(upstream)))
    {
        Ok(response) => response,
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to build stream response",
        )
            .into_response(),
    }
}

/// Copy upstream chunks as they arrive. A mid-stream read failure appends
/// one error frame and ends the stream instead of hanging the client.
fn relay_stream(
    upstream: reqwest::Response,
) -> impl Stream<Item = std::result::Result<Bytes, Infallible>> {
    async_stream::stream! {
        let mut chunks = upstream.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => yield Ok(bytes),
                Err(error) => {
                    tracing::warn!("upstream stream failed mid-relay: {}", error);
                    let frame = sse_error_frame(&format!("upstream stream failed: {error}"));
                    yield Ok(Bytes::from(frame));
                    break;
                }
            }
        }
    }
}
