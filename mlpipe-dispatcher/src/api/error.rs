//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::repository::StoreError;
use crate::service::dispatch::DispatchError;
use crate::service::intake::IntakeError;
use crate::service::job::JobError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// The request was understood but the compute API refused the job
    Unprocessable(String),
    /// Capacity or network missing; the caller may retry
    Unavailable(String),
    StoreError(StoreError),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::StoreError(err) => {
                tracing::error!("Job store error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::StoreError(err)
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::InvalidTrigger(e) => ApiError::BadRequest(e.to_string()),
            IntakeError::Resolution(e) => ApiError::Unavailable(e.to_string()),
            IntakeError::Dispatch(e) => e.into(),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            e @ DispatchError::Submission { .. } => ApiError::Unprocessable(e.to_string()),
            e @ DispatchError::ResourceUnavailable { .. } => ApiError::Unavailable(e.to_string()),
            DispatchError::Store(e) => ApiError::StoreError(e),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
            JobError::InvalidState(msg) => ApiError::Conflict(msg),
            JobError::ValidationError(msg) => ApiError::BadRequest(msg),
            JobError::StoreError(e) => ApiError::StoreError(e),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
