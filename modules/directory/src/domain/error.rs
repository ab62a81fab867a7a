use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Invalid email format: '{email}'")]
    InvalidEmail { email: String },

    #[error("Full name cannot be empty")]
    EmptyFullName,

    #[error("Full name too long: {len} characters (max: {max})")]
    FullNameTooLong { len: usize, max: usize },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },
}

impl DomainError {
    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn invalid_email(email: impl Into<String>) -> Self {
        Self::InvalidEmail {
            email: email.into(),
        }
    }

    pub fn full_name_too_long(len: usize, max: usize) -> Self {
        Self::FullNameTooLong { len, max }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl DomainError {
    /// Write failure for a profile carrying `email`. A unique-index hit means a
    /// concurrent upsert claimed the address between our check and the write.
    pub fn from_profile_write(e: sea_orm::DbErr, email: &str) -> Self {
        match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                Self::email_already_exists(email)
            }
            _ => e.into(),
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::database(e.to_string())
    }
}
