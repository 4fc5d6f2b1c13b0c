//! Error handling for the API server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use wayfare::FieldError;
use wayfare_backend::BackendError;

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Media library is not configured")]
    MediaDisabled,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<wayfare::WayfareError> for ApiError {
    fn from(error: wayfare::WayfareError) -> Self {
        ApiError::Backend(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut fields: &[FieldError] = &[];
        let (status, error_message) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::MediaDisabled => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ApiError::Serialization(_) => {
                (StatusCode::BAD_REQUEST, "Invalid JSON format".to_string())
            }
            ApiError::Backend(e) => match e {
                BackendError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
                BackendError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                BackendError::Validation(e) => {
                    fields = e.field_errors();
                    (StatusCode::BAD_REQUEST, e.user_message())
                }
                BackendError::Unauthorized(_) => {
                    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
                }
                BackendError::Forbidden(_) => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
                BackendError::MediaDisabled => {
                    (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
                }
                _ => {
                    error!("Backend failure: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
                }
            },
            ApiError::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string())
            }
            ApiError::Internal(_) | ApiError::Io(_) => {
                error!("Internal failure: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = if fields.is_empty() {
            json!({
                "error": error_message,
                "status": status.as_u16()
            })
        } else {
            json!({
                "error": error_message,
                "status": status.as_u16(),
                "fields": fields
            })
        };

        (status, Json(body)).into_response()
    }
}

// Convenience functions for common errors
impl ApiError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::BadRequest(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        Self::Internal(msg.to_string())
    }

    /// Collapse everything but authorization and input problems into a 500
    pub fn opaque(self) -> Self {
        match self {
            ApiError::Backend(
                BackendError::Unauthorized(_)
                | BackendError::Forbidden(_)
                | BackendError::Validation(_),
            )
            | ApiError::Unauthorized(_)
            | ApiError::Forbidden(_)
            | ApiError::BadRequest(_) => self,
            other => ApiError::Internal(other.to_string()),
        }
    }
}
