//! Goal endpoints: listing, creation, session completion and templates

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
use crate::db::{Goal, NewGoal};
use crate::templates::apply_template;

#[derive(Deserialize)]
pub struct CreateGoalRequest {
    pub user_id: i64,
    pub topic_id: i64,
    pub description: Option<String>,
    /// Signed so non-positive targets get a validation error, not a parse error
    pub target_sessions: i64,
    pub due_date: Option<String>,
}

#[derive(Deserialize)]
pub struct TemplateRequest {
    pub user_id: i64,
}

#[derive(Serialize)]
pub struct GoalResponse {
    pub id: i64,
    pub user_id: i64,
    pub topic_id: i64,
    pub description: Option<String>,
    pub target_sessions: u32,
    pub completed_sessions: u32,
    pub due_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Goal> for GoalResponse {
    fn from(goal: Goal) -> Self {
        Self {
            id: goal.id,
            user_id: goal.user_id,
            topic_id: goal.topic_id,
            description: goal.description,
            target_sessions: goal.target_sessions,
            completed_sessions: goal.completed_sessions,
            due_date: goal.due_date,
            created_at: goal.created_at,
        }
    }
}

async fn list_goals(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<GoalResponse>>, ApiError> {
    let goals = state.goals.list_for_user(user_id).map_err(api_error)?;
    Ok(Json(goals.into_iter().map(GoalResponse::from).collect()))
}

async fn create_goal(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<GoalResponse>), ApiError> {
    let target_sessions = u32::try_from(req.target_sessions)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| validation_error("target_sessions must be positive"))?;

    let goal = state
        .goals
        .create(&NewGoal {
            user_id: req.user_id,
            topic_id: req.topic_id,
            description: req.description,
            target_sessions,
            due_date: req.due_date,
        })
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(goal.into())))
}

/// Record one completed session; reaching the target earns bonus XP
async fn complete_session(
    State(state): State<Arc<ApiState>>,
    Path(goal_id): Path<i64>,
) -> Result<Json<GoalResponse>, ApiError> {
    let goal = state.goals.record_session(goal_id).map_err(api_error)?;

    if goal.is_complete()
        && let Err(e) = state.progress.award_goal_bonus_today(goal.user_id)
    {
        tracing::warn!(goal_id, error = %e, "failed to award goal bonus");
    }

    Ok(Json(goal.into()))
}

async fn create_from_template(
    State(state): State<Arc<ApiState>>,
    Path(subject): Path<String>,
    Json(req): Json<TemplateRequest>,
) -> Result<(StatusCode, Json<Vec<GoalResponse>>), ApiError> {
    let goals = apply_template(&subject, req.user_id, &state.topics, &state.goals)
        .map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(goals.into_iter().map(GoalResponse::from).collect()),
    ))
}

/// Build goal routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/goals", post(create_goal))
        .route("/goals/{id}", get(list_goals))
        .route("/goals/{id}/complete", post(complete_session))
        .route("/goals/templates/{subject}", post(create_from_template))
        .with_state(state)
}
