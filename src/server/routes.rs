//! Route handlers and the shared-secret guard

use super::AppState;
use crate::events::{
    CredentialDeletePayload, CredentialSavePayload, WorkflowDeletePayload, WorkflowSavePayload,
};
use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

pub(super) fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/webhook/workflow-save", post(workflow_save))
        .route("/webhook/workflow-delete", post(workflow_delete))
        .route("/webhook/credential-save", post(credential_save))
        .route("/webhook/credential-delete", post(credential_delete))
        .layer(middleware::from_fn_with_state(state.clone(), require_secret));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct AuthQuery {
    secret: Option<String>,
}

/// Shared-secret guard for the webhook routes.
///
/// Accepts the `x-webhook-secret` header or a `?secret=` query parameter.
/// With no secret configured, authentication is a no-op.
async fn require_secret(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = &state.secret {
        let provided = headers
            .get("x-webhook-secret")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .or(query.secret);

        if provided.as_deref() != Some(expected.as_str()) {
            log::warn!("unauthorized request rejected");
            return error_response(StatusCode::UNAUTHORIZED, "unauthorized");
        }
    }
    next.run(request).await
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn workflow_save(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WorkflowSavePayload>,
) -> Response {
    log::info!(
        "received workflow save: {} folder={} event={}",
        payload.original_name,
        payload.folder_path.as_deref().unwrap_or("root"),
        payload.event
    );

    if let Err(message) = payload.validate() {
        log::warn!("invalid workflow save payload: {message}");
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    match state.store.save(
        &payload.workflow,
        &payload.original_name,
        payload.workflow_id.as_deref(),
        payload.folder_path.as_deref(),
    ) {
        Ok(path) => {
            log::info!("saved workflow: {} -> {}", payload.original_name, path.display());
            ok_response(json!({ "status": "ok", "path": path.display().to_string() }))
        }
        Err(e) => {
            log::error!("failed to save workflow {}: {e}", payload.original_name);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to save workflow")
        }
    }
}

async fn workflow_delete(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WorkflowDeletePayload>,
) -> Response {
    log::info!(
        "received workflow delete: {} name={}",
        payload.workflow_id,
        payload.workflow_name.as_deref().unwrap_or("?")
    );

    if let Err(message) = payload.validate() {
        log::warn!("invalid workflow delete payload: {message}");
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    match state
        .store
        .delete(&payload.workflow_id, payload.workflow_name.as_deref())
    {
        Ok(Some(path)) => {
            log::info!("deleted workflow: {} ({})", payload.workflow_id, path.display());
            ok_response(json!({ "status": "ok", "path": path.display().to_string() }))
        }
        Ok(None) => {
            log::warn!("workflow file not found: {}", payload.workflow_id);
            ok_response(json!({ "status": "ok", "message": "file not found" }))
        }
        Err(e) => {
            log::error!("failed to delete workflow {}: {e}", payload.workflow_id);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to delete workflow")
        }
    }
}

async fn credential_save(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialSavePayload>,
) -> Response {
    log::info!(
        "received credential save: {} type={} event={}",
        payload.name,
        payload.r#type,
        payload.event
    );

    if let Err(message) = payload.validate() {
        log::warn!("invalid credential save payload: {message}");
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    match state
        .reconciler
        .apply_save(payload.id.as_deref(), &payload.name, &payload.r#type)
        .await
    {
        Ok(key) => ok_response(json!({ "status": "ok", "key": key })),
        Err(e) => {
            log::error!("failed to save credential {}: {e}", payload.name);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to save credential")
        }
    }
}

async fn credential_delete(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialDeletePayload>,
) -> Response {
    log::info!("received credential delete: {}", payload.id);

    if let Err(message) = payload.validate() {
        log::warn!("invalid credential delete payload: {message}");
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    match state.reconciler.apply_delete(&payload.id) {
        Ok(deleted) => ok_response(json!({ "status": "ok", "deleted": deleted })),
        Err(e) => {
            log::error!("failed to delete credential {}: {e}", payload.id);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to delete credential")
        }
    }
}

fn ok_response(body: Value) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
