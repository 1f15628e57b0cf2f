//! HTTP error mapping.

use crate::job::{ports::SessionStoreError, services::IntakeError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The submission carried no usable question.
    #[error("Please pass a 'question' in the request body")]
    MissingQuestion,

    /// The status request carried no usable identifier.
    #[error("Please pass an 'id' query parameter")]
    MissingId,

    /// A store or queue operation failed.
    #[error("{0}")]
    Internal(String),
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::MissingQuestion => Self::MissingQuestion,
            IntakeError::Queue(queue_error) => Self::Internal(queue_error.to_string()),
        }
    }
}

impl From<SessionStoreError> for ApiError {
    fn from(err: SessionStoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingQuestion => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            Self::MissingId => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            Self::Internal(detail) => {
                error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}
