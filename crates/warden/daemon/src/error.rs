//! Error types for warden-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use warden_service::GovernanceError;

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unknown bearer credential
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// RBAC check failed
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict (duplicate rule, role in use, terminal approval)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Execution denied for lack of credits
    #[error("insufficient credit: {0}")]
    InsufficientCredit(String),

    /// Storage unavailable
    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl From<GovernanceError> for ApiError {
    fn from(value: GovernanceError) -> Self {
        match value {
            GovernanceError::Validation(_) => Self::BadRequest(value.to_string()),
            GovernanceError::NotFound(_) => Self::NotFound(value.to_string()),
            GovernanceError::Forbidden(_) => Self::Forbidden(value.to_string()),
            GovernanceError::InsufficientCredit { .. } => {
                Self::InsufficientCredit(value.to_string())
            }
            GovernanceError::InvalidState(_) | GovernanceError::Conflict(_) => {
                Self::Conflict(value.to_string())
            }
            GovernanceError::Storage(_) => Self::Storage(value.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::InsufficientCredit(_) => (StatusCode::BAD_REQUEST, "INSUFFICIENT_CREDIT"),
            ApiError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE"),
        };

        let body = ErrorResponse {
            message: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ApiError::Unauthorized("x".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".to_string()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(GovernanceError::InvalidState("x".to_string()))
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(GovernanceError::InsufficientCredit {
                balance: 1,
                required: 5
            })
            .into_response()
            .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
