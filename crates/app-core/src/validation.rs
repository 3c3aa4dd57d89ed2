//! Form validation
//!
//! Local checks run before any request is built. A failed check never
//! reaches the network layer.

use thiserror::Error;

/// A required field was missing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Offending field
    pub field: &'static str,
    /// User-facing message
    pub message: String,
}

impl ValidationError {
    /// Create a validation error
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check that `value` is non-empty as typed
pub fn require(field: &'static str, value: &str, message: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}

/// Check that `value` has non-whitespace content, returning it trimmed
pub fn require_trimmed<'a>(
    field: &'static str,
    value: &'a str,
    message: &str,
) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, message));
    }
    Ok(trimmed)
}

/// Check that `value` has non-whitespace content
pub fn has_content(value: &str) -> bool {
    !value.trim().is_empty()
}
