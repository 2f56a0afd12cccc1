//! HTTP error mapping.
//!
//! # Invariants
//! - Every error body is `{"error": <message>}`.
//! - Internal failures are logged with detail and answered with a generic
//!   message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use thiserror::Error;
use vocassion_core::{DbError, LoggingError, ServiceError};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Insufficient points")]
    InsufficientPoints { available: i64, required: i64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) | Self::InsufficientPoints { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation(err) => Self::BadRequest(err.to_string()),
            err @ ServiceError::NotFound { .. } => Self::NotFound(err.to_string()),
            ServiceError::Conflict(message) => Self::Conflict(message),
            ServiceError::InsufficientPoints {
                available,
                required,
            } => Self::InsufficientPoints {
                available,
                required,
            },
            ServiceError::Repo(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Internal(detail) => {
                error!(
                    "event=http_request module=api status=error kind=internal detail={}",
                    detail
                );
                json!({ "error": "Internal Error" })
            }
            Self::InsufficientPoints {
                available,
                required,
            } => {
                warn!(
                    "event=http_request module=api status=error kind=insufficient_points available={} required={}",
                    available, required
                );
                json!({
                    "error": self.to_string(),
                    "available": available,
                    "required": required,
                })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Failures that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("logging init failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("database open failed: {0}")]
    Database(#[from] DbError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use vocassion_core::{ServiceError, ValidationError};

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (
                ServiceError::Validation(ValidationError::Required("name")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::NotFound {
                    entity: "goal",
                    id: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::Conflict("Challenge already completed".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::InsufficientPoints {
                    available: 10,
                    required: 50,
                },
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (service_error, status) in cases {
            assert_eq!(ApiError::from(service_error).status(), status);
        }
    }

    #[test]
    fn insufficient_points_message_is_stable() {
        let err = ApiError::from(ServiceError::InsufficientPoints {
            available: 0,
            required: 1,
        });
        assert_eq!(err.to_string(), "Insufficient points");
    }
}
