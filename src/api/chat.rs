//! Chat endpoints: tutored conversation and history

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{api_error, error_response, validation_error, ApiError};
use super::ApiState;
use crate::context::ContextBuilder;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub user_id: i64,
    pub thread_id: i64,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Serialize)]
pub struct HistoryItem {
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Thread must exist and belong to the user
fn require_thread(state: &ApiState, user_id: i64, thread_id: i64) -> Result<(), ApiError> {
    match state.threads.find(thread_id).map_err(api_error)? {
        Some(thread) if thread.user_id == user_id => Ok(()),
        _ => Err((
            StatusCode::NOT_FOUND,
            error_response("not_found", "Thread not found"),
        )),
    }
}

/// Answer a message with context, record it and credit progress
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(validation_error("message must not be empty"));
    }
    require_thread(&state, req.user_id, req.thread_id)?;

    let context = state
        .context
        .build(req.user_id, req.thread_id)
        .map_err(api_error)?;
    let prompt = ContextBuilder::format_prompt(&context, &req.message);

    let response = state.tutor.respond(&prompt).await;

    state
        .threads
        .add_message(req.user_id, req.thread_id, &req.message, &response)
        .map_err(api_error)?;

    // The reply is already stored; a progress failure must not lose it
    if let Err(e) = state.progress.record_chat_today(req.user_id) {
        tracing::warn!(user_id = req.user_id, error = %e, "failed to record chat progress");
    }

    Ok(Json(ChatResponse { response }))
}

async fn history(
    State(state): State<Arc<ApiState>>,
    Path((user_id, thread_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    let messages = state
        .threads
        .messages(user_id, thread_id)
        .map_err(api_error)?;

    Ok(Json(
        messages
            .into_iter()
            .map(|m| HistoryItem {
                message: m.message,
                response: m.response,
                timestamp: m.created_at,
            })
            .collect(),
    ))
}

/// Build chat routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/history/{user_id}/{thread_id}", get(history))
        .with_state(state)
}
