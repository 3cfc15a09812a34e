//! AiApp relay server
//!
//! Thin HTTP layer in front of the upstream Dify API: resolves the target
//! app, forwards the request, and pipes streaming responses back untouched.

pub mod api;
pub mod config;
pub mod registry;

use api::AppState;
use api::apps::list_apps;
use api::messages::{message_feedback, stop_chat_message, suggested_questions};
use api::relay::{chat_messages, completion_messages, workflow_run_block, workflow_run_stream};
use axum::{
    Router,
    routing::{get, post},
};

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "aiapp relay is working!".to_string(),
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // App catalog (read-only)
        .route("/api/apps", get(list_apps))
        // Message relays (dual streaming/blocking)
        .route("/api/dify/chat-messages", post(chat_messages))
        .route("/api/dify/completion-messages", post(completion_messages))
        // Workflow relays (mode fixed per route)
        .route("/api/dify/workflow/run/stream", post(workflow_run_stream))
        .route("/api/dify/workflow/run/block", post(workflow_run_block))
        // Auxiliary message operations
        .route(
            "/api/dify/chat-messages/{task_id}/stop",
            post(stop_chat_message),
        )
        .route(
            "/api/dify/messages/{message_id}/feedbacks",
            post(message_feedback),
        )
        .route(
            "/api/dify/messages/{message_id}/suggested",
            get(suggested_questions),
        )
        .with_state(state)
}
