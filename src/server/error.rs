//! HTTP error taxonomy.
//!
//! Every failure a handler can produce maps to exactly one response shape.
//! The search endpoint has its own 400/404 pair, distinct from both the
//! validation 422 and the entity 404.

use crate::catalog_store::validation::{ValidationErrors, ValidationFailure};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("The given data was invalid.")]
    Validation(ValidationErrors),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Missing search query")]
    MissingSearchQuery,

    #[error("No songs found")]
    EmptySearchResult,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationFailure> for ApiError {
    fn from(failure: ValidationFailure) -> Self {
        match failure {
            ValidationFailure::Invalid(errors) => ApiError::Validation(errors),
            ValidationFailure::Storage(err) => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": "The given data was invalid.",
                    "errors": errors,
                })),
            )
                .into_response(),
            ApiError::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                Json(json!({"message": format!("{} not found", entity)})),
            )
                .into_response(),
            ApiError::MissingSearchQuery => (
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "Missing search query"})),
            )
                .into_response(),
            ApiError::EmptySearchResult => (
                StatusCode::NOT_FOUND,
                Json(json!({"message": "No songs found"})),
            )
                .into_response(),
            ApiError::Internal(err) => {
                error!("Request failed: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"message": "Internal server error"})),
                )
                    .into_response()
            }
        }
    }
}
