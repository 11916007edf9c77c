//! Thread summary endpoints
//!
//! A written summary stands for the thread's current older-message prefix;
//! the context builder replaces it once that prefix grows.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{api_error, check_length, error_response, ApiError};
use super::ApiState;
use crate::db::{StoredSummary, SummaryRecord};

#[derive(Deserialize)]
pub struct SummaryRequest {
    pub user_id: i64,
    pub thread_id: i64,
    pub summary: String,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub user_id: i64,
    pub thread_id: i64,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<SummaryRecord> for SummaryResponse {
    fn from(record: SummaryRecord) -> Self {
        Self {
            user_id: record.user_id,
            thread_id: record.thread_id,
            summary: record.summary.text,
            updated_at: Some(record.updated_at),
        }
    }
}

impl SummaryResponse {
    fn written(req: SummaryRequest) -> Self {
        Self {
            user_id: req.user_id,
            thread_id: req.thread_id,
            summary: req.summary.trim().to_string(),
            updated_at: None,
        }
    }
}

/// Summary text plus the prefix length it stands for
fn written_summary(state: &ApiState, req: &SummaryRequest) -> Result<StoredSummary, ApiError> {
    check_length("summary", req.summary.trim(), 1, 10_000)?;
    let covered = state
        .context
        .summary_prefix_len(req.user_id, req.thread_id)
        .map_err(api_error)?;
    Ok(StoredSummary::new(req.summary.trim(), covered))
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        error_response("not_found", "Summary not found"),
    )
}

async fn get_summary(
    State(state): State<Arc<ApiState>>,
    Path((user_id, thread_id)): Path<(i64, i64)>,
) -> Result<Json<SummaryResponse>, ApiError> {
    state
        .summaries
        .get(user_id, thread_id)
        .map_err(api_error)?
        .map(|record| Json(record.into()))
        .ok_or_else(not_found)
}

async fn create_summary(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<SummaryRequest>,
) -> Result<(StatusCode, Json<SummaryResponse>), ApiError> {
    let summary = written_summary(&state, &req)?;
    match state.threads.find(req.thread_id).map_err(api_error)? {
        Some(thread) if thread.user_id == req.user_id => {}
        _ => {
            return Err((
                StatusCode::NOT_FOUND,
                error_response("not_found", "Thread not found"),
            ));
        }
    }

    state
        .summaries
        .upsert(req.user_id, req.thread_id, &summary)
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(SummaryResponse::written(req))))
}

async fn update_summary(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = written_summary(&state, &req)?;
    state
        .summaries
        .update(req.user_id, req.thread_id, &summary)
        .map_err(api_error)?;

    Ok(Json(SummaryResponse::written(req)))
}

/// Build summary routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/summaries", post(create_summary).put(update_summary))
        .route("/summaries/{user_id}/{thread_id}", get(get_summary))
        .with_state(state)
}
