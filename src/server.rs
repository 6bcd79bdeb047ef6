//! HTTP server — ingest endpoint plus read-back and health routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use base64::Engine;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::error::{Error, IngestError};
use crate::pipeline::IngestPipeline;
use crate::store::{MessageStore, TaskStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub messages: Arc<MessageStore>,
    pub tasks: Arc<TaskStore>,
}

/// Build the Axum router with ingest, read-back, and health routes.
pub fn ingest_routes(
    pipeline: Arc<IngestPipeline>,
    messages: Arc<MessageStore>,
    tasks: Arc<TaskStore>,
) -> Router {
    let state = AppState {
        pipeline,
        messages,
        tasks,
    };

    Router::new()
        .route("/ingest", post(ingest))
        .route("/health", get(health))
        .route("/inbox/{user_id}/messages", get(list_messages))
        .route("/inbox/{user_id}/tasks", get(list_tasks))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mailsense"
    }))
}

// ── Ingest ──────────────────────────────────────────────────────────

/// Ingest request body. The wire format is camelCase.
#[derive(Debug, Deserialize)]
struct IngestRequest {
    #[serde(rename = "userId")]
    user_id: String,
    raw: String,
    /// `"base64"` decodes `raw` before parsing; anything else is verbatim.
    encoding: Option<String>,
}

async fn ingest(
    State(state): State<AppState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> impl IntoResponse {
    // Any body problem (not JSON, missing userId/raw) is a 400 here;
    // 422 is reserved for content the MIME parser rejects.
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Ingest body rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"ok": false, "error": rejection.body_text()})),
            );
        }
    };

    let raw = match decode_raw(&req) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(user_id = %req.user_id, error = %e, "Ingest body rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"ok": false, "error": e.to_string()})),
            );
        }
    };

    match state.pipeline.ingest(&req.user_id, &raw).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "ok": true,
                "msgId": outcome.msg_id,
                "tasksCreated": outcome.tasks_created,
            })),
        ),
        Err(e) => {
            let status = error_status(&e);
            if status.is_server_error() {
                error!(user_id = %req.user_id, error = %e, "Ingest failed");
            } else {
                warn!(user_id = %req.user_id, error = %e, "Ingest rejected");
            }
            (
                status,
                Json(serde_json::json!({"ok": false, "error": e.to_string()})),
            )
        }
    }
}

/// Decode the raw payload per the request's declared encoding.
fn decode_raw(req: &IngestRequest) -> Result<Vec<u8>, IngestError> {
    match req.encoding.as_deref() {
        Some("base64") => base64::engine::general_purpose::STANDARD
            .decode(&req.raw)
            .map_err(|e| IngestError::InvalidRequest(format!("invalid base64 payload: {e}"))),
        _ => Ok(req.raw.clone().into_bytes()),
    }
}

fn error_status(e: &Error) -> StatusCode {
    match e {
        Error::Mail(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Inference(_) => StatusCode::BAD_GATEWAY,
        Error::Ingest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ── Read-back ───────────────────────────────────────────────────────

async fn list_messages(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.messages.list(&user_id).await {
        Ok(records) => (StatusCode::OK, Json(serde_json::json!(records))),
        Err(e) => {
            error!(user_id, error = %e, "Message listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"ok": false, "error": e.to_string()})),
            )
        }
    }
}

async fn list_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.tasks.list(&user_id).await {
        Ok(tasks) => (StatusCode::OK, Json(serde_json::json!(tasks))),
        Err(e) => {
            error!(user_id, error = %e, "Task listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"ok": false, "error": e.to_string()})),
            )
        }
    }
}
