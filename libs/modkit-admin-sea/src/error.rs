//! Adapter errors and their translation into the admin contract's errors.

use modkit_admin::{AdminError, FormValidationError};
use sea_orm::DbErr;
use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, SeaAdminError>;

#[derive(Debug, Error)]
pub enum SeaAdminError {
    #[error(transparent)]
    Db(#[from] DbErr),

    #[error("cannot convert value for '{field}': {reason}")]
    Coerce { field: String, reason: String },

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// File payload rejected by the storage layer or malformed.
    #[error("invalid file for '{key}': {msg}")]
    FileValidation { key: String, msg: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Admin(#[from] AdminError),
}

impl SeaAdminError {
    pub(crate) fn coerce(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Coerce {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was raised by the database driver.
    #[must_use]
    pub fn is_db(&self) -> bool {
        matches!(self, Self::Db(_))
    }
}

impl From<SeaAdminError> for AdminError {
    fn from(err: SeaAdminError) -> Self {
        match err {
            SeaAdminError::Admin(inner) => inner,
            SeaAdminError::Db(e) => AdminError::Backend(anyhow::Error::new(e)),
            SeaAdminError::UnknownField(name) => {
                AdminError::InvalidQuery(format!("unknown field: {name}"))
            }
            SeaAdminError::InvalidFilter(msg) => AdminError::InvalidQuery(msg),
            SeaAdminError::Coerce { field, reason } => {
                AdminError::InvalidQuery(format!("cannot convert value for '{field}': {reason}"))
            }
            SeaAdminError::FileValidation { key, msg } => {
                AdminError::FormValidation(FormValidationError::new().with(key, msg))
            }
            SeaAdminError::Config(msg) => AdminError::Backend(anyhow::anyhow!(msg)),
        }
    }
}
