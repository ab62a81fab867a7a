use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("User not found: {id}")]
    NotFound { id: Uuid },

    #[error("User with email '{email}' already exists")]
    Conflict { email: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error")]
    Internal,
}

impl DirectoryError {
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    pub fn conflict(email: impl Into<String>) -> Self {
        Self::Conflict {
            email: email.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
