//! Domain error types for the frontdesk module.

use thiserror::Error;

/// Domain-level errors.
///
/// Authorization denials are deliberately expressed as `NotFound`: a
/// matching identifier owned by an unauthorized tenant must be
/// indistinguishable from an absent one.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The requested entity was not found (or is not visible to the caller).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A local field failed validation before any remote call was attempted.
    #[error("validation failed on {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Local storage failure.
    #[error("database error: {0}")]
    Database(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Database(e.to_string())
    }
}
