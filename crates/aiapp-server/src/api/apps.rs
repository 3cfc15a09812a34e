//! Read-only app catalog listing

use aiapp_relay::AppKind;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;

/// Public projection of an app profile. The API key never leaves the
/// server.
#[derive(Debug, Serialize)]
pub struct AppSummary {
    pub id: String,
    pub name: String,
    pub kind: AppKind,
    pub description: String,
}

// GET /api/apps
pub async fn list_apps(State(state): State<AppState>) -> Json<Vec<AppSummary>> {
    let apps = state
        .registry
        .list()
        .into_iter()
        .map(|app| AppSummary {
            id: app.id.clone(),
            name: app.name.clone(),
            kind: app.kind,
            description: app.description.clone(),
        })
        .collect();
    Json(apps)
}
