use serde::{Deserialize, Serialize};
use std::fmt;

/// Required input missing or blank.
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// Status change whose precondition does not hold.
pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
/// Operation references an id absent from the store.
pub const NOT_FOUND: &str = "NOT_FOUND";
/// Admin-only operation requested without admin capability.
pub const NOT_AUTHORIZED: &str = "NOT_AUTHORIZED";

/// Single structured error shape used across layers and handed to the host UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(VALIDATION_ERROR, message)
    }

    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::new(INVALID_TRANSITION, message)
    }

    pub fn not_found(report_id: &str) -> Self {
        Self::new(NOT_FOUND, "Report not found").with_details(format!("id={report_id}"))
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
