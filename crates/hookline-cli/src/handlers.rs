//! HTTP handlers
//!
//! どのエラーも `{"message": "..."}` で返す。

use std::fmt::Display;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{info, warn};

use hookline_core::domain::{CallbackId, CreateCallbackRequest};

use crate::server::AppState;

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    message: &'static str,
    callback_id: CallbackId,
}

/// POST /callback
pub async fn create_callback(State(state): State<AppState>, body: Bytes) -> Response {
    // 壊れた JSON は空リクエスト扱い（URL 検証で 400 になる）
    let request: CreateCallbackRequest = serde_json::from_slice(&body).unwrap_or_default();

    let callback = match request.into_callback(state.clock.now()) {
        Ok(callback) => Arc::new(callback),
        Err(e) => return message(StatusCode::BAD_REQUEST, format!("bad request: {e}")),
    };
    let deadline = callback.deadline();

    match state.store.save(callback).await {
        Ok(callback_id) => {
            info!(callback_id = %callback_id, %deadline, "callback accepted");
            (
                StatusCode::OK,
                Json(CreatedResponse {
                    message: "ok",
                    callback_id,
                }),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// GET /callback/{id}
pub async fn get_callback(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = CallbackId::new(id);
    match state.store.get(&id).await {
        Some(callback) => Json(callback.snapshot()).into_response(),
        None => message(StatusCode::NOT_FOUND, format!("not found: {id}")),
    }
}

/// GET /healthz
pub async fn healthz() -> Response {
    message(StatusCode::OK, "ok".to_string())
}

fn internal_error(e: impl Display) -> Response {
    warn!(error = %e, "failed to save callback");
    message(StatusCode::INTERNAL_SERVER_ERROR, format!("internal error: {e}"))
}

fn message(status: StatusCode, message: String) -> Response {
    (status, Json(MessageResponse { message })).into_response()
}
