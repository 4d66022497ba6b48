//! Liveness endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::ui::state::AppState;

/// `GET /health`, with the number of open push channels.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let connections = state.presence.connection_count().await;
    Json(serde_json::json!({"status": "ok", "connections": connections}))
}
