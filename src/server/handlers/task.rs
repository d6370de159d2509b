//! Task endpoint handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::InferenceError;
use crate::server::state::AppState;
use crate::types::TaskKind;

/// Handle text-to-SQL generation requests.
pub async fn handle_text2sql(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    run_task(state, TaskKind::Sql, body).await
}

/// Handle summarization requests.
pub async fn handle_summary(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    run_task(state, TaskKind::Summary, body).await
}

/// Generation is CPU/GPU bound, so the whole request runs on a blocking thread.
async fn run_task(state: AppState, task: TaskKind, body: Bytes) -> (StatusCode, Json<Value>) {
    debug!(task = %task, bytes = body.len(), "Request received");

    let handler = state.engine.handler(task);
    let worker = Arc::clone(&handler);
    let (status, value) = match tokio::task::spawn_blocking(move || worker.handle(&body)).await {
        Ok(response) => response,
        Err(e) => {
            error!(task = %task, error = %e, "Generation worker panicked");
            handler.failure(&InferenceError::Worker(e.to_string()))
        }
    };

    (status, Json(value))
}
