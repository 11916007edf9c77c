//! Error envelope shared by all handlers

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Handler error: status plus JSON envelope
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(code: &str, message: &str) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
        },
    })
}

/// 422 for request fields that fail validation
pub fn validation_error(message: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        error_response("validation_error", message),
    )
}

/// Map a domain error onto a status code
#[allow(clippy::needless_pass_by_value)]
pub fn api_error(err: Error) -> ApiError {
    match &err {
        Error::NotFound(message) => (StatusCode::NOT_FOUND, error_response("not_found", message)),
        Error::Conflict(message) => (StatusCode::BAD_REQUEST, error_response("conflict", message)),
        Error::InvalidRequest(message) => (
            StatusCode::BAD_REQUEST,
            error_response("invalid_request", message),
        ),
        Error::Validation(message) => validation_error(message),
        _ => {
            tracing::error!(error = %err, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_response("internal_error", &err.to_string()),
            )
        }
    }
}

/// Check a string length in characters
pub fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(validation_error(&format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}
