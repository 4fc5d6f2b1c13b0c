//! Error types for the wayfare backend

use thiserror::Error;
use wayfare::{BookingError, WayfareError};

use crate::mail::MailError;
use crate::storage::blob_storage::StorageError;

/// Backend-specific errors
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(WayfareError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Media error: {0}")]
    Media(#[from] StorageError),

    #[error("Media library is not configured")]
    MediaDisabled,

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<WayfareError> for BackendError {
    fn from(error: WayfareError) -> Self {
        match error {
            WayfareError::Booking(BookingError::AlreadyPaid(id)) => {
                BackendError::Conflict(format!("Reservation {} has already been paid", id))
            }
            other => BackendError::Validation(other),
        }
    }
}

impl BackendError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: &str, message: &str) -> Self {
        BackendError::Validation(wayfare::ValidationErrors::single(field, message).into())
    }
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;
