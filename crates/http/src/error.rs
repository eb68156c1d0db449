//! Error handling for the bookshelf HTTP layer

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::response::STATUS_ERROR;
use crate::validation::FieldViolation;

pub const INVALID_REQUEST_BODY: &str = "Invalid request body";
pub const INVALID_UUID: &str = "Invalid uuid";
pub const VALIDATION_FAILED: &str = "Validation failed";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
pub const REQUEST_TIMED_OUT: &str = "Request timed out";
pub const TOO_MANY_REQUESTS: &str = "Too many requests";

/// Error envelope written for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldViolation>>,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed: {} violation(s)", .violations.len())]
    Validation { violations: Vec<FieldViolation> },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("request timed out")]
    Timeout,

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::Validation { violations }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            AppError::RateLimited { retry_after_secs } => Some(retry_after_secs.to_string()),
            _ => None,
        };

        let body = match self {
            AppError::Validation { violations } => ErrorBody {
                status: STATUS_ERROR,
                message: VALIDATION_FAILED.to_string(),
                errors: Some(violations),
            },
            AppError::Conflict { message }
            | AppError::NotFound { message }
            | AppError::BadRequest { message } => {
                tracing::debug!(status_code = %status.as_u16(), %message, "request rejected");
                ErrorBody {
                    status: STATUS_ERROR,
                    message,
                    errors: None,
                }
            }
            AppError::Timeout => ErrorBody {
                status: STATUS_ERROR,
                message: REQUEST_TIMED_OUT.to_string(),
                errors: None,
            },
            AppError::RateLimited { .. } => ErrorBody {
                status: STATUS_ERROR,
                message: TOO_MANY_REQUESTS.to_string(),
                errors: None,
            },
            AppError::Internal(err) => {
                // Details stay in the logs; the client only gets the generic message.
                tracing::error!(error = ?err, "unexpected error");
                ErrorBody {
                    status: STATUS_ERROR,
                    message: INTERNAL_SERVER_ERROR.to_string(),
                    errors: None,
                }
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = retry_after.and_then(|secs| secs.parse().ok()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}
