//! Simulated subscription endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::{api_error, error_response, ApiError};
use super::ApiState;
use crate::db::{Subscription, SubscriptionStatus};

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub user_id: i64,
    /// `subscribe` or `cancel`
    pub action: String,
}

#[derive(Serialize)]
pub struct SubscriptionResponse {
    pub user_id: i64,
    pub status: SubscriptionStatus,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            user_id: sub.user_id,
            status: sub.status,
            start_date: sub.start_date,
            end_date: sub.end_date,
        }
    }
}

async fn subscribe(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let sub = match req.action.as_str() {
        "subscribe" => state.subscriptions.activate(req.user_id),
        "cancel" => state.subscriptions.cancel(req.user_id),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                error_response("invalid_request", "Invalid action"),
            ));
        }
    }
    .map_err(api_error)?;

    Ok(Json(sub.into()))
}

async fn get_subscription(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let sub = state.subscriptions.get(user_id).map_err(api_error)?;
    Ok(Json(sub.into()))
}

/// Build subscription routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/subscription/{id}", get(get_subscription))
        .with_state(state)
}
