//! Topic endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::error::{api_error, check_length, ApiError};
use super::ApiState;
use crate::db::Topic;

#[derive(Deserialize)]
pub struct CreateTopicRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct TopicResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<Topic> for TopicResponse {
    fn from(topic: Topic) -> Self {
        Self {
            id: topic.id,
            name: topic.name,
            description: topic.description,
        }
    }
}

async fn list_topics(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<TopicResponse>>, ApiError> {
    let topics = state.topics.list().map_err(api_error)?;
    Ok(Json(topics.into_iter().map(TopicResponse::from).collect()))
}

async fn create_topic(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CreateTopicRequest>,
) -> Result<(StatusCode, Json<TopicResponse>), ApiError> {
    let name = req.name.trim();
    check_length("name", name, 1, 100)?;

    let topic = state
        .topics
        .create(name, req.description.as_deref())
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(topic.into())))
}

/// Build topic routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/topics", get(list_topics).post(create_topic))
        .with_state(state)
}
