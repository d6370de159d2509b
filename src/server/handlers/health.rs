//! Health check handler.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::server::state::AppState;
use crate::types::TaskKind;

/// Handle health check requests. Lists the served tasks.
pub async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    let tasks: Vec<&str> = state.engine.info().tasks.into_iter().map(TaskKind::name).collect();
    Json(json!({
        "status": "ok",
        "tasks": tasks,
    }))
}
