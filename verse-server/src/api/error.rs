//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use verse_common::validation::ValidationError;
use verse_common::Error;

/// Error returned by every handler
///
/// Bodies always carry a human-readable `error` string; validation failures
/// add the offending `field`, duplicates add `duplicate: true`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(ValidationError),
    NotFound(String),
    Duplicate(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(e) => ApiError::BadRequest(e),
            Error::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            e @ Error::Duplicate { .. } => ApiError::Duplicate(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(e) => {
                let body = match e.field {
                    Some(field) => json!({ "error": e.message, "field": field }),
                    None => json!({ "error": e.message }),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Duplicate(msg) => (
                StatusCode::CONFLICT,
                Json(json!({ "error": msg, "duplicate": true })),
            )
                .into_response(),
            ApiError::Internal(msg) => {
                error!("Request failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
