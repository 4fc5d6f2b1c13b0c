//! Error types for the wayfare domain library
//!
//! Everything in this crate is pure, so the only failures are rejected input
//! (validation), impossible bookings and bad edits to a staged list. Errors
//! are grouped by domain the same way the backend and server crates group
//! theirs, so each layer can map them without string matching.

use std::fmt;
use thiserror::Error;

/// Main error type for the wayfare library
#[derive(Error, Debug)]
pub enum WayfareError {
    /// Form or request payload failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A booking could not be priced or scheduled
    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    /// An edit to a staged list referenced something that is not there
    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All field errors collected while validating one payload
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether any error was recorded against `field`
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Turn the collected errors into a result
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(WayfareError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors raised while pricing or scheduling a booking
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Start and end dates are required for {category}")]
    MissingDates { category: String },

    #[error("End date must be after start date (computed total {total})")]
    NonPositiveTotal { total: f64 },

    #[error("Service is not available for booking: {0}")]
    Unavailable(String),

    #[error("Reservation {0} has already been paid")]
    AlreadyPaid(String),
}

/// Errors raised while editing a staged list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StagingError {
    #[error("No staged item with id {0}")]
    UnknownId(String),

    #[error("Duplicate id {0} in staged list")]
    DuplicateId(String),
}

/// Shorthand result type for wayfare operations
pub type Result<T> = std::result::Result<T, WayfareError>;

impl WayfareError {
    /// Field errors when this is a validation failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            WayfareError::Validation(errors) => &errors.errors,
            _ => &[],
        }
    }

    /// Message safe to show to the person who filled in the form
    pub fn user_message(&self) -> String {
        match self {
            WayfareError::Validation(errors) => match errors.errors.first() {
                Some(first) if errors.len() == 1 => first.message.clone(),
                _ => format!("Please correct {} fields", errors.len()),
            },
            WayfareError::Booking(e) => e.to_string(),
            WayfareError::Staging(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_collected_errors_fail() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "Name is required");
        errors.push("price", "Price must not be negative");

        assert!(errors.has("price"));
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.field_errors().len(), 2);
        assert_eq!(err.user_message(), "Please correct 2 fields");
    }

    #[test]
    fn test_single_error_message() {
        let err = WayfareError::from(ValidationErrors::single("email", "Email is invalid"));
        assert_eq!(err.user_message(), "Email is invalid");
        assert_eq!(err.to_string(), "Validation failed: email: Email is invalid");
    }
}
