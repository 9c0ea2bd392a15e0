//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use order_store::StoreError;
use saga::SagaError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
///
/// Business outcomes of a saga (rejected, failed, cancelled orders) are not
/// errors; they are returned as regular responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    InvalidOrder(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Saga(#[from] SagaError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::InvalidOrder(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Saga(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Saga(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
