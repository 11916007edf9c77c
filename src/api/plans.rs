//! Study plan endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{api_error, ApiError};
use super::goals::GoalResponse;
use super::ApiState;
use crate::db::{NewPlan, Plan};

#[derive(Deserialize)]
pub struct CreatePlanRequest {
    pub user_id: i64,
    #[serde(default)]
    pub goal_ids: Vec<i64>,
    pub due_date: Option<String>,
    pub recurrence: Option<String>,
}

#[derive(Serialize)]
pub struct PlanResponse {
    pub id: i64,
    pub user_id: i64,
    pub goals: Vec<GoalResponse>,
    pub due_date: Option<String>,
    pub recurrence: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            id: plan.id,
            user_id: plan.user_id,
            goals: plan.goals.into_iter().map(GoalResponse::from).collect(),
            due_date: plan.due_date,
            recurrence: plan.recurrence,
            created_at: plan.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub status: &'static str,
}

async fn create_plan(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<PlanResponse>), ApiError> {
    let plan = state
        .plans
        .create(&NewPlan {
            user_id: req.user_id,
            goal_ids: req.goal_ids,
            due_date: req.due_date,
            recurrence: req.recurrence,
        })
        .map_err(api_error)?;

    tracing::info!(plan_id = plan.id, user_id = plan.user_id, "plan created");
    Ok((StatusCode::CREATED, Json(plan.into())))
}

async fn list_plans(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<PlanResponse>>, ApiError> {
    let plans = state.plans.list_for_user(user_id).map_err(api_error)?;
    Ok(Json(plans.into_iter().map(PlanResponse::from).collect()))
}

async fn delete_plan(
    State(state): State<Arc<ApiState>>,
    Path(plan_id): Path<i64>,
) -> Result<Json<DeletedResponse>, ApiError> {
    state.plans.delete(plan_id).map_err(api_error)?;
    Ok(Json(DeletedResponse { status: "deleted" }))
}

/// Build plan routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/plans", post(create_plan))
        .route("/plans/{id}", get(list_plans).delete(delete_plan))
        .with_state(state)
}
