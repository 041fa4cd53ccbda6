use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AccountError, TokenError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    Conflict(String),

    ValidationError(String),

    Unauthorized(String),

    Forbidden(String),

    /// Expired or already-used token.
    Gone(String),

    /// Transient storage failure; the caller may retry.
    ServiceUnavailable(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Gone(msg) => write!(f, "Gone: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Gone(msg) => (StatusCode::GONE, msg.clone()),
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Transient storage failure: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Temporarily unavailable, please retry".to_string(),
                )
            }
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Conflict => ApiError::Conflict(err.to_string()),
            AccountError::NotFound => ApiError::NotFound(err.to_string()),
            AccountError::Forbidden(msg) => ApiError::Forbidden(msg),
            AccountError::Unauthorized => ApiError::Unauthorized(err.to_string()),
            AccountError::Validation(msg) => ApiError::ValidationError(msg),
            AccountError::Transient(msg) => ApiError::ServiceUnavailable(msg),
            AccountError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotFound => ApiError::NotFound(err.to_string()),
            TokenError::Expired | TokenError::AlreadyUsed => ApiError::Gone(err.to_string()),
            TokenError::Validation(msg) => ApiError::ValidationError(msg),
            TokenError::Transient(msg) => ApiError::ServiceUnavailable(msg),
            TokenError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
