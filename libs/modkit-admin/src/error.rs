//! Admin contract error types.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Library-local result type.
pub type AdminResult<T> = Result<T, AdminError>;

/// Per-field validation messages shown next to form inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct FormValidationError {
    errors: BTreeMap<String, String>,
}

impl FormValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the message for `field`.
    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.insert(field, message);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    #[must_use]
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for FormValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "form validation failed")?;
        let mut sep = ": ";
        for (field, message) in &self.errors {
            write!(f, "{sep}{field}: {message}")?;
            sep = ", ";
        }
        Ok(())
    }
}

impl std::error::Error for FormValidationError {}

/// Errors surfaced through the `ModelView` contract.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    FormValidation(#[from] FormValidationError),

    #[error("action failed: {0}")]
    ActionFailed(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("object not found")]
    NotFound,

    #[error("request extension missing: {0}")]
    MissingExtension(&'static str),

    #[error("unknown view: {0}")]
    UnknownView(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl AdminError {
    /// Shortcut for a single-field validation failure.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FormValidation(FormValidationError::new().with(field, message))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn form_validation_display_lists_fields_in_order() {
        let err = FormValidationError::new()
            .with("title", "too short")
            .with("body", "required");
        assert_eq!(
            err.to_string(),
            "form validation failed: body: required, title: too short"
        );
        assert_eq!(err.get("title"), Some("too short"));
    }

    #[test]
    fn field_shortcut_wraps_single_message() {
        let AdminError::FormValidation(inner) = AdminError::field("email", "invalid") else {
            panic!("expected form validation error");
        };
        assert_eq!(inner.errors().len(), 1);
        assert_eq!(inner.get("email"), Some("invalid"));
    }
}
