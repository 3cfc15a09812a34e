//! Auxiliary message operations forwarded upstream
//!
//! Blocking passthroughs that accompany a chat surface: stopping a running
//! generation, rating an answer, fetching suggested follow-ups.

use aiapp_relay::AppKind;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use crate::api::relay::{RelayParams, blocking_reply};
use crate::api::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StopRequest {
    #[serde(default)]
    pub user: Option<String>,
}

// POST /api/dify/chat-messages/{task_id}/stop?appId=
pub async fn stop_chat_message(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(params): Query<RelayParams>,
    Json(request): Json<StopRequest>,
) -> Response {
    let app = match state.resolve(params.app_id.as_deref(), AppKind::Chat) {
        Ok(app) => app,
        Err(failure) => return failure.into_response(),
    };

    let user = request.user.unwrap_or_default();
    blocking_reply(state.dify.stop_generation(&app, &task_id, &user).await)
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

// POST /api/dify/messages/{message_id}/feedbacks?appId=
pub async fn message_feedback(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Query(params): Query<RelayParams>,
    Json(request): Json<FeedbackRequest>,
) -> Response {
    let app = match state.resolve(params.app_id.as_deref(), AppKind::Chat) {
        Ok(app) => app,
        Err(failure) => return failure.into_response(),
    };

    let user = request.user.unwrap_or_default();
    blocking_reply(
        state
            .dify
            .message_feedback(
                &app,
                &message_id,
                request.rating.as_deref(),
                &user,
                request.content.as_deref(),
            )
            .await,
    )
}

#[derive(Debug, Deserialize)]
pub struct SuggestedParams {
    #[serde(rename = "appId")]
    pub app_id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

// GET /api/dify/messages/{message_id}/suggested?appId=&user=
//
// A failed upstream lookup degrades to an empty list instead of failing
// the chat surface.
pub async fn suggested_questions(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Query(params): Query<SuggestedParams>,
) -> Response {
    let app = match state.resolve(params.app_id.as_deref(), AppKind::Chat) {
        Ok(app) => app,
        Err(failure) => return failure.into_response(),
    };

    let user = params.user.unwrap_or_default();
    let questions = match state
        .dify
        .suggested_questions(&app, &message_id, &user)
        .await
    {
        Ok(questions) => questions,
        Err(error) => {
            tracing::warn!("failed to fetch suggested questions: {}", error);
            Vec::new()
        }
    };

    Json(json!({ "result": "success", "data": questions })).into_response()
}
