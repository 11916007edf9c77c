//! Topic feedback endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{api_error, validation_error, ApiError};
use super::ApiState;
use crate::db::{Feedback, NewFeedback};

#[derive(Deserialize)]
pub struct CreateFeedbackRequest {
    pub user_id: i64,
    pub topic_id: i64,
    pub rating: i64,
    pub comments: Option<String>,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub id: i64,
    pub user_id: i64,
    pub topic_id: i64,
    pub rating: u8,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(feedback: Feedback) -> Self {
        Self {
            id: feedback.id,
            user_id: feedback.user_id,
            topic_id: feedback.topic_id,
            rating: feedback.rating,
            comments: feedback.comments,
            created_at: feedback.created_at,
        }
    }
}

async fn create_feedback(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), ApiError> {
    let rating = u8::try_from(req.rating)
        .ok()
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| validation_error("rating must be between 1 and 5"))?;

    let feedback = state
        .feedback
        .create(&NewFeedback {
            user_id: req.user_id,
            topic_id: req.topic_id,
            rating,
            comments: req.comments,
        })
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(feedback.into())))
}

async fn list_feedback(
    State(state): State<Arc<ApiState>>,
    Path(topic_id): Path<i64>,
) -> Result<Json<Vec<FeedbackResponse>>, ApiError> {
    let feedback = state.feedback.list_for_topic(topic_id).map_err(api_error)?;
    Ok(Json(feedback.into_iter().map(FeedbackResponse::from).collect()))
}

/// Build feedback routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/feedback", post(create_feedback))
        .route("/feedback/{id}", get(list_feedback))
        .with_state(state)
}
