//! Conversation thread endpoints

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
use crate::db::Thread;

#[derive(Deserialize)]
pub struct CreateThreadRequest {
    pub user_id: i64,
    pub name: String,
}

#[derive(Serialize)]
pub struct ThreadResponse {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Thread> for ThreadResponse {
    fn from(thread: Thread) -> Self {
        Self {
            id: thread.id,
            user_id: thread.user_id,
            name: thread.name,
            created_at: thread.created_at,
        }
    }
}

async fn list_threads(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<ThreadResponse>>, ApiError> {
    let threads = state.threads.list_for_user(user_id).map_err(api_error)?;
    Ok(Json(threads.into_iter().map(ThreadResponse::from).collect()))
}

async fn create_thread(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CreateThreadRequest>,
) -> Result<(StatusCode, Json<ThreadResponse>), ApiError> {
    let name = req.name.trim();
    check_length("name", name, 1, 100)?;

    if !state.users.exists(req.user_id).map_err(api_error)? {
        return Err((
            StatusCode::NOT_FOUND,
            error_response("not_found", "User not found"),
        ));
    }

    let thread = state
        .threads
        .create(req.user_id, name)
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(thread.into())))
}

/// Build thread routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/threads", post(create_thread))
        .route("/threads/{id}", get(list_threads))
        .with_state(state)
}
