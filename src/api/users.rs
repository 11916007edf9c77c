//! Account endpoints: registration, login, profile and dashboard

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::{api_error, check_length, error_response, ApiError};
use super::ApiState;
use crate::db::{ActivityStats, Role, SubscriptionStatus, User};
use crate::progress::ProgressReport;
use crate::security::{hash_password, verify_password};

// --- Request/Response types ---

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user_id: i64,
    pub role: Role,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub subscription_status: SubscriptionStatus,
    pub message_count: usize,
    pub xp: u64,
    pub level: u32,
    pub streak_count: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub next_level_xp: Option<u64>,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub user_id: i64,
    pub total_messages: usize,
    pub last_activity: Option<DateTime<Utc>>,
    pub sessions_count: usize,
    pub badges: Vec<&'static str>,
    pub xp: u64,
    pub level: u32,
    pub streak_count: u32,
    pub next_level_xp: Option<u64>,
}

/// Badges earned from chat activity
#[must_use]
pub fn badges(stats: &ActivityStats) -> Vec<&'static str> {
    let mut badges = Vec::new();
    if stats.total_messages >= 1 {
        badges.push("First Chat Completed");
    }
    if stats.total_messages >= 10 {
        badges.push("10 Messages");
    }
    if stats.session_days >= 5 {
        badges.push("5 Sessions");
    }
    badges
}

// --- Handlers ---

async fn register(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let username = req.username.trim();
    check_length("username", username, 3, 50)?;
    check_length("password", &req.password, 4, 128)?;

    let user = state
        .users
        .create(username, &hash_password(&req.password), req.role)
        .map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            role: user.role,
        }),
    ))
}

async fn login(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials = state
        .users
        .find_credentials(req.username.trim())
        .map_err(api_error)?;

    match credentials {
        Some((user, hash)) if verify_password(&req.password, &hash) => {
            tracing::info!(user_id = user.id, "user logged in");
            Ok(Json(LoginResponse {
                message: "Login successful",
                user_id: user.id,
                role: user.role,
            }))
        }
        _ => Err((
            StatusCode::UNAUTHORIZED,
            error_response("unauthorized", "Invalid username or password"),
        )),
    }
}

fn require_user(state: &ApiState, user_id: i64) -> Result<User, ApiError> {
    state.users.find(user_id).map_err(api_error)?.ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            error_response("not_found", "User not found"),
        )
    })
}

async fn get_user(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = require_user(&state, user_id)?;
    let subscription = state.subscriptions.get(user_id).map_err(api_error)?;
    let message_count = state.threads.message_count(user_id).map_err(api_error)?;
    let ProgressReport {
        xp,
        level,
        streak_count,
        last_activity_date,
        next_level_xp,
    } = state.progress.report_for(user.progress);

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
        role: user.role,
        subscription_status: subscription.status,
        message_count,
        xp,
        level,
        streak_count,
        last_activity_date,
        next_level_xp,
    }))
}

async fn dashboard(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let user = require_user(&state, user_id)?;
    let stats = state.threads.activity_stats(user_id).map_err(api_error)?;
    let report = state.progress.report_for(user.progress);

    Ok(Json(DashboardResponse {
        user_id,
        total_messages: stats.total_messages,
        last_activity: stats.last_activity,
        sessions_count: stats.session_days,
        badges: badges(&stats),
        xp: report.xp,
        level: report.level,
        streak_count: report.streak_count,
        next_level_xp: report.next_level_xp,
    }))
}

/// Build account routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/users/{id}", get(get_user))
        .route("/dashboard/{id}", get(dashboard))
        .with_state(state)
}
