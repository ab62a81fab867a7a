use thiserror::Error;
use uuid::Uuid;

use crate::domain::assignment::AssigneeError;
use crate::domain::membership::MembershipError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Project not found: {id}")]
    ProjectNotFound { id: Uuid },

    #[error("Task not found: {id}")]
    TaskNotFound { id: Uuid },

    #[error("Comment not found: {id}")]
    CommentNotFound { id: Uuid },

    #[error("{message}")]
    Forbidden { message: String },

    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error(transparent)]
    Assignee(#[from] AssigneeError),

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn project_not_found(id: Uuid) -> Self {
        Self::ProjectNotFound { id }
    }

    pub fn task_not_found(id: Uuid) -> Self {
        Self::TaskNotFound { id }
    }

    pub fn comment_not_found(id: Uuid) -> Self {
        Self::CommentNotFound { id }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
