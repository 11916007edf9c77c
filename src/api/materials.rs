//! Study materials catalogue endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use super::error::{error_response, ApiError};
use super::ApiState;
use crate::materials::MissingMaterial;

#[derive(Serialize)]
pub struct SubjectsResponse {
    pub subjects: Vec<String>,
}

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub subject: String,
    pub categories: Vec<String>,
}

fn subject_not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        error_response("not_found", "Subject not found"),
    )
}

async fn list_subjects(State(state): State<Arc<ApiState>>) -> Json<SubjectsResponse> {
    Json(SubjectsResponse {
        subjects: state
            .materials
            .subjects()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

async fn list_categories(
    State(state): State<Arc<ApiState>>,
    Path(subject): Path<String>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = state
        .materials
        .categories(&subject)
        .ok_or_else(subject_not_found)?
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(Json(CategoriesResponse {
        subject: subject.to_lowercase(),
        categories,
    }))
}

async fn get_content(
    State(state): State<Arc<ApiState>>,
    Path((subject, category)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    match state.materials.content(&subject, &category) {
        Ok(content) => Ok(Json(content.clone())),
        Err(MissingMaterial::Subject) => Err(subject_not_found()),
        Err(MissingMaterial::Category) => Err((
            StatusCode::NOT_FOUND,
            error_response("not_found", "Category not found"),
        )),
    }
}

/// Build materials routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/materials", get(list_subjects))
        .route("/materials/{subject}", get(list_categories))
        .route("/materials/{subject}/{category}", get(get_content))
        .with_state(state)
}
